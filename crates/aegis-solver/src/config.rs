// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Planner configuration.
//!
//! Loaded from the file named by `AEGIS_CONFIG`, else `./aegis.toml`, else
//! built-in defaults. Every section is optional in the file.

use crate::{
    baseline::BaselineParams, smoothing::SmoothingParams, throughput::ThroughputParams,
    vessel::VesselParams,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "AEGIS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "aegis.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Run the rate smoother after the throughput optimizer.
    pub smooth: bool,
    pub vessel: VesselParams,
    pub throughput: ThroughputParams,
    pub baseline: BaselineParams,
    pub smoothing: SmoothingParams,
}

impl PlannerConfig {
    /// Loads the configuration, falling back to defaults when no usable file
    /// is found.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded planner config from {}", CONFIG_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV);
            }
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!("Loaded planner config from ./{}", DEFAULT_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", DEFAULT_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Planner config saved");
        Ok(())
    }

    /// Checks every section and reports all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let v = &self.vessel;
        if v.time_limit_secs == 0 {
            errors.push("vessel.time_limit_secs must be positive".to_string());
        }
        Self::check_non_negative(v.tardiness_penalty, "vessel.tardiness_penalty", &mut errors);

        let t = &self.throughput;
        if t.time_limit_secs == 0 {
            errors.push("throughput.time_limit_secs must be positive".to_string());
        }
        Self::check_non_negative(t.min_threshold, "throughput.min_threshold", &mut errors);
        Self::check_non_negative(t.max_daily_change, "throughput.max_daily_change", &mut errors);
        Self::check_positive(t.default_capacity, "throughput.default_capacity", &mut errors);
        if let Some(cap) = t.plant_capacity {
            Self::check_non_negative(cap, "throughput.plant_capacity", &mut errors);
            if cap < t.min_threshold {
                errors.push(format!(
                    "throughput.plant_capacity ({}) must be >= throughput.min_threshold ({})",
                    cap, t.min_threshold
                ));
            }
        }
        if let Some(cap) = t.max_total_inventory {
            Self::check_non_negative(cap, "throughput.max_total_inventory", &mut errors);
        }

        let s = &self.smoothing;
        Self::check_non_negative(s.min_threshold, "smoothing.min_threshold", &mut errors);
        Self::check_non_negative(s.headroom, "smoothing.headroom", &mut errors);
        Self::check_non_negative(s.min_borrow_rate, "smoothing.min_borrow_rate", &mut errors);
        Self::check_positive(s.default_capacity, "smoothing.default_capacity", &mut errors);
        if !(s.borrow_fraction > 0.0 && s.borrow_fraction <= 1.0) {
            errors.push(format!(
                "smoothing.borrow_fraction ({}) must be in (0, 1]",
                s.borrow_fraction
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_non_negative(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("{} ({}) must be a non-negative number", name, value));
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{} ({}) must be positive", name, value));
        }
    }
}

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

use aegis_model::prelude::{ProgramLoader, ScheduleDocument, VesselArrivalDocument, VesselProgram};
use aegis_model::problem::loader::{load_plant, read_json_path};
use aegis_solver::prelude::*;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[command(name = "aegis")]
#[command(about = "Refinery crude planner: vessel allocation and throughput optimization")]
#[command(version)]
struct Cli {
    /// Planner config file; defaults to $AEGIS_CONFIG, then ./aegis.toml.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Solver time limit in seconds, for every solve of this run.
    #[arg(long, global = true)]
    time_limit: Option<u64>,

    /// Write the result here instead of stdout.
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ProgramArgs {
    /// Loading program JSON.
    #[arg(long, value_name = "FILE")]
    program: PathBuf,

    #[arg(long, default_value = "Melaka")]
    destination: String,

    /// Travel days assumed for routes missing from the program.
    #[arg(long, default_value_t = 2.0)]
    default_travel_days: f64,

    /// Minimize vessel count first and treat tardiness as a tie breaker.
    #[arg(long)]
    ignore_dates: bool,
}

#[derive(Args, Debug)]
struct ThroughputArgs {
    #[arg(long)]
    min_threshold: Option<f64>,

    #[arg(long)]
    max_daily_change: Option<f64>,

    #[arg(long)]
    plant_capacity: Option<f64>,

    #[arg(long)]
    max_total_inventory: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Group parcels into the fewest vessels.
    Vessels {
        #[command(flatten)]
        program: ProgramArgs,
    },
    /// Build the greedy schedule for a plant and a list of vessel arrivals.
    Baseline {
        /// Plant description JSON.
        #[arg(long, value_name = "FILE")]
        plant: PathBuf,

        /// JSON array of vessel arrivals.
        #[arg(long, value_name = "FILE")]
        arrivals: PathBuf,
    },
    /// Optimize the processing rates of a schedule.
    Throughput {
        #[arg(long, value_name = "FILE")]
        schedule: PathBuf,

        #[command(flatten)]
        limits: ThroughputArgs,
    },
    /// Lift days below the minimum rate by borrowing from the day before.
    Smooth {
        #[arg(long, value_name = "FILE")]
        schedule: PathBuf,

        #[arg(long)]
        min_threshold: Option<f64>,
    },
    /// Vessels, baseline schedule, throughput and optional smoothing in one go.
    Plan {
        #[command(flatten)]
        program: ProgramArgs,

        #[arg(long, value_name = "FILE")]
        plant: PathBuf,

        #[command(flatten)]
        limits: ThroughputArgs,

        /// Run the rate smoother after the throughput optimizer.
        #[arg(long)]
        smooth: bool,
    },
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<PlannerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::load_from_file(path)?,
        None => PlannerConfig::load(),
    };
    if let Some(secs) = cli.time_limit {
        config.vessel.time_limit_secs = secs;
        config.throughput.time_limit_secs = secs;
    }
    Ok(config)
}

fn apply_limits(params: &mut ThroughputParams, limits: &ThroughputArgs) {
    if let Some(v) = limits.min_threshold {
        params.min_threshold = v;
    }
    if let Some(v) = limits.max_daily_change {
        params.max_daily_change = v;
    }
    if limits.plant_capacity.is_some() {
        params.plant_capacity = limits.plant_capacity;
    }
    if limits.max_total_inventory.is_some() {
        params.max_total_inventory = limits.max_total_inventory;
    }
}

/// The smoother shares the optimizer's daily floor in a full plan.
fn apply_plan_limits(config: &mut PlannerConfig, limits: &ThroughputArgs) {
    apply_limits(&mut config.throughput, limits);
    if let Some(v) = limits.min_threshold {
        config.smoothing.min_threshold = v;
    }
}

fn load_program(args: &ProgramArgs) -> Result<VesselProgram, Box<dyn std::error::Error>> {
    let program = ProgramLoader::new()
        .destination(args.destination.clone())
        .default_travel_days(args.default_travel_days)
        .from_path(&args.program)?;
    tracing::info!(
        parcels = program.parcels().len(),
        grades = program.grades().len(),
        "Loaded program {}",
        args.program.display()
    );
    Ok(program)
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_tracing();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    let output = cli.output.as_deref();

    match &cli.command {
        Command::Vessels { program } => {
            if program.ignore_dates {
                config.vessel.prioritize_dates = false;
            }
            let p = load_program(program)?;
            let report = VesselSolver::new(config.vessel.clone()).report(&p);
            emit(&report, output)?;
            if !report.is_optimal() {
                std::process::exit(1);
            }
        }
        Command::Baseline { plant, arrivals } => {
            let plant = load_plant(plant)?;
            let arrivals: Vec<VesselArrivalDocument> = read_json_path(arrivals)?;
            let outcome = BaselineScheduler::new(&plant, config.baseline.clone()).build(&arrivals)?;
            emit(&outcome.to_document(), output)?;
        }
        Command::Throughput { schedule, limits } => {
            apply_limits(&mut config.throughput, limits);
            config.validate()?;
            let mut doc = ScheduleDocument::from_path(schedule)?;
            let report = ThroughputOptimizer::new(config.throughput.clone()).optimize_document(&mut doc)?;
            if let ThroughputReport::Failed { message } = &report {
                tracing::warn!("{}", message);
            }
            emit(&doc, output)?;
        }
        Command::Smooth {
            schedule,
            min_threshold,
        } => {
            if let Some(v) = min_threshold {
                config.smoothing.min_threshold = *v;
            }
            config.validate()?;
            let mut doc = ScheduleDocument::from_path(schedule)?;
            let n = RateSmoother::new(config.smoothing.clone()).smooth_document(&mut doc)?;
            tracing::info!(adjustments = n, "Smoothing done");
            emit(&doc, output)?;
        }
        Command::Plan {
            program,
            plant,
            limits,
            smooth,
        } => {
            if program.ignore_dates {
                config.vessel.prioritize_dates = false;
            }
            config.smooth |= *smooth;
            apply_plan_limits(&mut config, limits);
            config.validate()?;
            let p = load_program(program)?;
            let plant = load_plant(plant)?;
            let outcome = Planner::new(config).plan(&p, &plant)?;
            tracing::info!(
                vessels = outcome.allocation().vessel_count(),
                freight_cost = outcome.allocation().freight_cost(),
                held = outcome.held().len(),
                "Plan complete"
            );
            emit(outcome.document(), output)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(min_threshold: Option<f64>) -> ThroughputArgs {
        ThroughputArgs {
            min_threshold,
            max_daily_change: Some(15.0),
            plant_capacity: None,
            max_total_inventory: None,
        }
    }

    #[test]
    fn test_plan_threshold_reaches_smoother() {
        let mut config = PlannerConfig {
            smooth: true,
            ..Default::default()
        };
        apply_plan_limits(&mut config, &limits(Some(50.0)));
        assert_eq!(config.throughput.min_threshold, 50.0);
        assert_eq!(config.smoothing.min_threshold, 50.0);
        assert_eq!(config.throughput.max_daily_change, 15.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_plan_without_threshold_keeps_configured_floors() {
        let mut config = PlannerConfig::default();
        config.smoothing.min_threshold = 70.0;
        apply_plan_limits(&mut config, &limits(None));
        assert_eq!(config.throughput.min_threshold, 80.0);
        assert_eq!(config.smoothing.min_threshold, 70.0);
    }
}

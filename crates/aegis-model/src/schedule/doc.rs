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

//! Serde shapes of the schedule document.
//!
//! Every struct keeps the fields it does not model in `extra`, so a document
//! read, optimized and written back loses nothing.

use crate::{err::LoaderError, problem::loader::read_json_path};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, path::Path};

pub type Extra = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_inventory: Option<BTreeMap<String, f64>>,
    pub daily_plan: BTreeMap<String, DayPlanDocument>,
    #[serde(default)]
    pub vessel_arrivals: Vec<VesselArrivalDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub held_vessels: Vec<HeldVesselDocument>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ScheduleDocument {
    #[inline]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        read_json_path(path)
    }

    #[inline]
    pub fn from_str(s: &str) -> Result<Self, LoaderError> {
        Ok(serde_json::from_str(s)?)
    }

    #[inline]
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Top-level metadata entry such as `lp_optimization`.
    #[inline]
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    #[inline]
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayPlanDocument {
    #[serde(default)]
    pub processing_rates: BTreeMap<String, f64>,
    #[serde(default)]
    pub inventory_by_grade: BTreeMap<String, f64>,
    #[serde(default)]
    pub inventory: f64,
    #[serde(default)]
    pub blending_details: Vec<BlendDetailDocument>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendDetailDocument {
    pub primary_grade: String,
    #[serde(default)]
    pub secondary_grade: Option<String>,
    #[serde(default)]
    pub primary_rate: f64,
    #[serde(default)]
    pub secondary_rate: f64,
    #[serde(default)]
    pub total_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
    #[serde(default)]
    pub capacity_used: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_limit: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CargoDocument {
    pub grade: String,
    pub volume: f64,
    #[serde(default)]
    pub origin: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselArrivalDocument {
    pub arrival_day: i64,
    pub cargo: Vec<CargoDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldr_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_arrival_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_held: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl VesselArrivalDocument {
    #[inline]
    pub fn total_volume(&self) -> f64 {
        self.cargo.iter().map(|c| c.volume).sum()
    }
}

/// A vessel that could not discharge before the end of the horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeldVesselDocument {
    pub original_arrival_day: i64,
    pub days_held: i64,
    pub cargo: Vec<CargoDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldr_text: Option<String>,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_a_round_trip() {
        let text = r#"{
            "daily_plan": {
                "1": {
                    "processing_rates": {"A": 50},
                    "inventory_by_grade": {"A": 100},
                    "inventory": 100,
                    "date": "2025-10-01",
                    "blending_details": [
                        {"primary_grade": "A", "secondary_grade": null, "primary_rate": 50,
                         "total_rate": 50, "ratio": "1.00:0.00", "capacity_used": 50,
                         "capacity_limit": 95, "note": "kept"}
                    ]
                }
            },
            "vessel_arrivals": [
                {"arrival_day": 1, "cargo": [{"grade": "A", "volume": 150, "origin": "Sabah"}], "vessel_id": "V1"}
            ],
            "source": "baseline"
        }"#;
        let doc = ScheduleDocument::from_str(text).unwrap();
        let day = &doc.daily_plan["1"];
        assert_eq!(day.extra["date"], "2025-10-01");
        assert_eq!(day.blending_details[0].extra["note"], "kept");
        assert_eq!(doc.vessel_arrivals[0].extra["vessel_id"], "V1");
        assert_eq!(doc.metadata("source").unwrap(), "baseline");

        let back: Value = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["daily_plan"]["1"]["date"], "2025-10-01");
        assert_eq!(back["vessel_arrivals"][0]["vessel_id"], "V1");
        assert_eq!(back["source"], "baseline");
        assert!(back.get("opening_inventory").is_none());
    }

    #[test]
    fn test_set_metadata_overwrites() {
        let mut doc = ScheduleDocument::default();
        doc.set_metadata("lp_optimization", serde_json::json!({"objective_value": 1.0}));
        doc.set_metadata("lp_optimization", serde_json::json!({"objective_value": 2.0}));
        assert_eq!(doc.metadata("lp_optimization").unwrap()["objective_value"], 2.0);
    }
}

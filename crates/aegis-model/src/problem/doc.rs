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

//! Serde shapes of the vessel program document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselProgramDocument {
    pub loading_date_ranges: Vec<LoadingEntryDocument>,
    pub vessel_constraints: VesselConstraintsDocument,
    #[serde(default)]
    pub travel_times: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freight_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_vessel_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub target_delivery_dates: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingEntryDocument {
    pub grade: String,
    pub volume_kb: f64,
    pub ldr: LdrField,
    pub origin: String,
}

/// A single loading window or a list of them; each list entry is a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LdrField {
    One(String),
    Many(Vec<String>),
}

impl LdrField {
    pub fn windows(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            LdrField::One(s) => std::slice::from_ref(s),
            LdrField::Many(v) => v.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselConstraintsDocument {
    pub max_volume_per_vessel: VolumeCapsDocument,
    pub max_delivery_per_month: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freight_cost_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeCapsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_grade: Option<f64>,
    pub two_grades: f64,
    pub three_grades: f64,
}

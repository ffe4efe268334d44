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

//! Plant description for the baseline scheduler.
//!
//! Capacities arrive in barrels per day and are converted to kb/day, the
//! unit every schedule uses.

use crate::{
    err::{InputError, InvalidValueError, non_negative},
    recipe::Ratio,
};
use aegis_core::prelude::Volume;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BARRELS_PER_KB: f64 = 1000.0;

/// Marker used by plant documents for "no secondary grade".
const NO_PAIRING: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantDocument {
    pub plant_details: PlantDetailsDocument,
    #[serde(default)]
    pub crude_pairings_blending: Vec<PairingDocument>,
    #[serde(default)]
    pub margin_usd_per_bbl_oct: Vec<MarginDocument>,
    #[serde(default)]
    pub opening_inventory: Vec<OpeningStockDocument>,
    pub maximum_inventory: MaximumInventoryDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_day: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantDetailsDocument {
    pub capacity_bpd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingDocument {
    pub grade: String,
    pub paired_with: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_ratio: Option<String>,
    pub capacity_bpd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginDocument {
    pub grade: String,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningStockDocument {
    pub grade: String,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaximumInventoryDocument {
    pub volume: f64,
}

/// The preferred blend partner of a grade, if it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct Pairing {
    grade: String,
    paired_with: Option<String>,
    ratio: Ratio,
    capacity: Volume,
}

impl Pairing {
    #[inline]
    pub fn new(
        grade: impl Into<String>,
        paired_with: Option<String>,
        ratio: Ratio,
        capacity: Volume,
    ) -> Self {
        let ratio = if paired_with.is_some() { ratio } else { Ratio::pure() };
        Self {
            grade: grade.into(),
            paired_with,
            ratio,
            capacity,
        }
    }

    #[inline]
    pub fn grade(&self) -> &str {
        &self.grade
    }

    #[inline]
    pub fn paired_with(&self) -> Option<&str> {
        self.paired_with.as_deref()
    }

    #[inline]
    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    /// Daily ceiling in kb/day.
    #[inline]
    pub fn capacity(&self) -> Volume {
        self.capacity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantInput {
    capacity: Volume,
    pairings: BTreeMap<String, Pairing>,
    margins: BTreeMap<String, f64>,
    opening: BTreeMap<String, Volume>,
    maximum_inventory: Volume,
    horizon_days: u32,
    first_day: i64,
}

impl PlantInput {
    pub const DEFAULT_HORIZON_DAYS: u32 = 30;

    #[inline]
    pub fn new(capacity: Volume, maximum_inventory: Volume) -> Self {
        Self {
            capacity,
            pairings: BTreeMap::new(),
            margins: BTreeMap::new(),
            opening: BTreeMap::new(),
            maximum_inventory,
            horizon_days: Self::DEFAULT_HORIZON_DAYS,
            first_day: 1,
        }
    }

    #[inline]
    pub fn with_pairing(mut self, pairing: Pairing) -> Self {
        self.pairings.insert(pairing.grade.clone(), pairing);
        self
    }

    #[inline]
    pub fn with_margin(mut self, grade: impl Into<String>, margin: f64) -> Self {
        self.margins.insert(grade.into(), margin);
        self
    }

    /// Adds to the opening stock of `grade`; several tanks may hold one grade.
    #[inline]
    pub fn with_opening(mut self, grade: impl Into<String>, volume: Volume) -> Self {
        *self.opening.entry(grade.into()).or_insert(0.0) += volume;
        self
    }

    #[inline]
    pub fn with_horizon(mut self, first_day: i64, horizon_days: u32) -> Self {
        self.first_day = first_day;
        self.horizon_days = horizon_days;
        self
    }

    pub fn from_document(doc: &PlantDocument) -> Result<Self, InputError> {
        let capacity = non_negative("capacity_bpd", doc.plant_details.capacity_bpd)?;
        let max_inv = non_negative("maximum_inventory", doc.maximum_inventory.volume)?;
        let mut input = Self::new(capacity / BARRELS_PER_KB, max_inv);

        for p in &doc.crude_pairings_blending {
            let cap = non_negative("capacity_bpd", p.capacity_bpd)?;
            let partner = p.paired_with.trim();
            let (paired_with, ratio) = if partner.is_empty() || partner == NO_PAIRING {
                (None, Ratio::pure())
            } else if partner == p.grade {
                return Err(InputError::SelfBlend(p.grade.clone()));
            } else {
                let text = p
                    .pairing_ratio
                    .as_deref()
                    .ok_or(InputError::MissingField("pairing_ratio"))?;
                (Some(partner.to_string()), Ratio::parse(text)?)
            };
            input = input.with_pairing(Pairing::new(
                p.grade.clone(),
                paired_with,
                ratio,
                cap / BARRELS_PER_KB,
            ));
        }

        for m in &doc.margin_usd_per_bbl_oct {
            if !m.margin.is_finite() {
                return Err(InvalidValueError::new("margin", m.margin, "must be finite").into());
            }
            input = input.with_margin(m.grade.clone(), m.margin);
        }

        for s in &doc.opening_inventory {
            let v = non_negative("opening_inventory", s.volume)?;
            input = input.with_opening(s.grade.clone(), v);
        }

        let horizon = doc.processing_days.unwrap_or(Self::DEFAULT_HORIZON_DAYS);
        if horizon == 0 {
            return Err(InvalidValueError::new("processing_days", 0.0, "must be positive").into());
        }
        Ok(input.with_horizon(doc.first_day.unwrap_or(1), horizon))
    }

    /// Plant capacity in kb/day.
    #[inline]
    pub fn capacity(&self) -> Volume {
        self.capacity
    }

    #[inline]
    pub fn pairing(&self, grade: &str) -> Option<&Pairing> {
        self.pairings.get(grade)
    }

    #[inline]
    pub fn pairings(&self) -> impl Iterator<Item = &Pairing> {
        self.pairings.values()
    }

    /// Margin of `grade`, zero when unknown.
    #[inline]
    pub fn margin(&self, grade: &str) -> f64 {
        match self.margins.get(grade) {
            Some(m) => *m,
            None => {
                tracing::debug!(grade, "No margin for grade, using 0");
                0.0
            }
        }
    }

    /// Processing ceiling of a grade run alone: its pairing capacity, else
    /// the plant capacity.
    #[inline]
    pub fn solo_capacity(&self, grade: &str) -> Volume {
        self.pairings
            .get(grade)
            .map(Pairing::capacity)
            .unwrap_or(self.capacity)
    }

    #[inline]
    pub fn opening(&self) -> &BTreeMap<String, Volume> {
        &self.opening
    }

    #[inline]
    pub fn maximum_inventory(&self) -> Volume {
        self.maximum_inventory
    }

    #[inline]
    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    #[inline]
    pub fn first_day(&self) -> i64 {
        self.first_day
    }

    /// Every grade named anywhere in the plant description.
    pub fn grade_names(&self) -> impl Iterator<Item = &str> {
        self.pairings
            .values()
            .flat_map(|p| std::iter::once(p.grade()).chain(p.paired_with()))
            .chain(self.margins.keys().map(String::as_str))
            .chain(self.opening.keys().map(String::as_str))
    }
}

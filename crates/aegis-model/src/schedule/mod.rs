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

//! Typed day-by-day schedule.
//!
//! Days are kept in calendar order; all per-grade tables are dense vectors
//! indexed by [`GradeIndex`]. The closing inventory of day `d` is
//! `inventory[d-1] + arrivals[d] - processing[d]`, with the opening stock
//! standing in for `inventory[-1]`.

pub mod blend;
pub mod doc;

use crate::{
    err::{DayKeyError, InputError, non_negative},
    grade::{GradeIndex, GradeSet},
    schedule::{
        blend::BlendDetail,
        doc::{DayPlanDocument, ScheduleDocument, VesselArrivalDocument},
    },
};
use aegis_core::prelude::{DayPoint, EPSILON, Volume, clamp_non_negative};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct DaySchedule {
    key: String,
    day: DayPoint,
    arrivals: Vec<Volume>,
    processing: Vec<Volume>,
    inventory: Vec<Volume>,
    blending: Vec<BlendDetail>,
}

impl DaySchedule {
    #[inline]
    pub fn new(day: DayPoint, grade_count: usize) -> Self {
        Self {
            key: day.value().to_string(),
            day,
            arrivals: vec![0.0; grade_count],
            processing: vec![0.0; grade_count],
            inventory: vec![0.0; grade_count],
            blending: Vec::new(),
        }
    }

    /// Key of this day in the document's `daily_plan`.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn day(&self) -> DayPoint {
        self.day
    }

    #[inline]
    pub fn arrivals(&self) -> &[Volume] {
        &self.arrivals
    }

    #[inline]
    pub fn arrival(&self, grade: GradeIndex) -> Volume {
        self.arrivals[grade.get()]
    }

    #[inline]
    pub fn add_arrival(&mut self, grade: GradeIndex, volume: Volume) {
        self.arrivals[grade.get()] += volume;
    }

    #[inline]
    pub fn processing(&self) -> &[Volume] {
        &self.processing
    }

    #[inline]
    pub fn processing_of(&self, grade: GradeIndex) -> Volume {
        self.processing[grade.get()]
    }

    #[inline]
    pub fn set_processing(&mut self, grade: GradeIndex, rate: Volume) {
        self.processing[grade.get()] = rate;
    }

    #[inline]
    pub fn total_processing(&self) -> Volume {
        self.processing.iter().sum()
    }

    #[inline]
    pub fn inventory(&self) -> &[Volume] {
        &self.inventory
    }

    #[inline]
    pub fn inventory_of(&self, grade: GradeIndex) -> Volume {
        self.inventory[grade.get()]
    }

    #[inline]
    pub fn total_inventory(&self) -> Volume {
        self.inventory.iter().sum()
    }

    #[inline]
    pub fn blending(&self) -> &[BlendDetail] {
        &self.blending
    }

    #[inline]
    pub fn blending_mut(&mut self) -> &mut Vec<BlendDetail> {
        &mut self.blending
    }

    /// Replaces rates and blends together so that processing always matches
    /// the recorded blends.
    pub fn set_plan(&mut self, processing: Vec<Volume>, blending: Vec<BlendDetail>) {
        debug_assert_eq!(processing.len(), self.processing.len());
        self.processing = processing;
        self.blending = blending;
    }

    fn write_into(&self, plan: &mut DayPlanDocument, grades: &GradeSet) {
        plan.processing_rates = grades
            .iter()
            .map(|(g, name)| (name.to_string(), self.processing[g.get()]))
            .collect();
        plan.inventory_by_grade = grades
            .iter()
            .map(|(g, name)| (name.to_string(), self.inventory[g.get()]))
            .collect();
        plan.inventory = self.total_inventory();
        plan.blending_details = self.blending.iter().map(|b| b.to_document(grades)).collect();
    }
}

/// Largest violation of the inventory balance, located by day and grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConservationGap {
    pub day_index: usize,
    pub grade: GradeIndex,
    pub gap: Volume,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    grades: GradeSet,
    opening: Vec<Volume>,
    days: Vec<DaySchedule>,
}

impl Schedule {
    /// An empty plan of `horizon` consecutive days starting at `first_day`.
    pub fn empty(grades: GradeSet, opening: Vec<Volume>, first_day: i64, horizon: usize) -> Self {
        debug_assert_eq!(opening.len(), grades.len());
        let days = (0..horizon)
            .map(|i| DaySchedule::new(DayPoint::new(first_day + i as i64), grades.len()))
            .collect();
        let mut s = Self {
            grades,
            opening,
            days,
        };
        s.recompute_inventory();
        s
    }

    pub fn from_document(doc: &ScheduleDocument) -> Result<Self, InputError> {
        if doc.daily_plan.is_empty() {
            return Err(InputError::EmptySchedule);
        }

        let grades = GradeSet::from_names(collect_grade_names(doc));
        let n = grades.len();

        let mut keyed = Vec::with_capacity(doc.daily_plan.len());
        for (key, plan) in &doc.daily_plan {
            let number: i64 = key.trim().parse().map_err(|_| DayKeyError::new(key.clone()))?;
            keyed.push((number, key, plan));
        }
        keyed.sort_by_key(|(number, _, _)| *number);

        let mut days = Vec::with_capacity(keyed.len());
        let mut index_by_day = BTreeMap::new();
        for (i, (number, key, plan)) in keyed.into_iter().enumerate() {
            let mut day = DaySchedule::new(DayPoint::new(number), n);
            day.key = key.clone();
            for (name, rate) in &plan.processing_rates {
                let g = grades.require(name)?;
                day.processing[g.get()] = non_negative("processing_rates", *rate)?;
            }
            for (name, volume) in &plan.inventory_by_grade {
                day.inventory[grades.require(name)?.get()] = *volume;
            }
            for detail in &plan.blending_details {
                day.blending.push(BlendDetail::from_document(detail, &grades)?);
            }
            index_by_day.insert(number, i);
            days.push(day);
        }

        for vessel in &doc.vessel_arrivals {
            let Some(&i) = index_by_day.get(&vessel.arrival_day) else {
                tracing::warn!(
                    arrival_day = vessel.arrival_day,
                    "Vessel arrives outside the planned days, ignoring its cargo"
                );
                continue;
            };
            for cargo in &vessel.cargo {
                let g = grades.require(&cargo.grade)?;
                days[i].arrivals[g.get()] += non_negative("cargo.volume", cargo.volume)?;
            }
        }

        let opening = match &doc.opening_inventory {
            Some(map) => {
                let mut opening = grades.zeros();
                for (name, volume) in map {
                    opening[grades.require(name)?.get()] =
                        non_negative("opening_inventory", *volume)?;
                }
                opening
            }
            None => {
                // Undo the first day: stock = closing + processed - received.
                let first = &days[0];
                tracing::debug!(
                    day = first.day.value(),
                    "No opening inventory in document, reconstructing from first day"
                );
                (0..n)
                    .map(|g| {
                        (first.inventory[g] + first.processing[g] - first.arrivals[g]).max(0.0)
                    })
                    .collect()
            }
        };

        Ok(Self {
            grades,
            opening,
            days,
        })
    }

    #[inline]
    pub fn grades(&self) -> &GradeSet {
        &self.grades
    }

    #[inline]
    pub fn opening(&self) -> &[Volume] {
        &self.opening
    }

    #[inline]
    pub fn days(&self) -> &[DaySchedule] {
        &self.days
    }

    #[inline]
    pub fn days_mut(&mut self) -> &mut [DaySchedule] {
        &mut self.days
    }

    #[inline]
    pub fn day(&self, index: usize) -> Option<&DaySchedule> {
        self.days.get(index)
    }

    #[inline]
    pub fn day_mut(&mut self, index: usize) -> Option<&mut DaySchedule> {
        self.days.get_mut(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    #[inline]
    pub fn index_of_day(&self, day: DayPoint) -> Option<usize> {
        self.days.iter().position(|d| d.day == day)
    }

    /// Stock of each grade before processing on day `index`.
    pub fn stock_before(&self, index: usize) -> &[Volume] {
        match index {
            0 => &self.opening,
            i => &self.days[i - 1].inventory,
        }
    }

    /// Rebuilds closing inventory of every day from the opening stock.
    pub fn recompute_inventory(&mut self) {
        let mut stock = self.opening.clone();
        for day in &mut self.days {
            for (g, s) in stock.iter_mut().enumerate() {
                *s = clamp_non_negative(*s + day.arrivals[g] - day.processing[g]);
            }
            day.inventory.clone_from(&stock);
        }
    }

    /// The worst inventory-balance violation, or `None` if every day and
    /// grade balances.
    pub fn conservation_gap(&self) -> Option<ConservationGap> {
        let mut worst: Option<ConservationGap> = None;
        for (i, day) in self.days.iter().enumerate() {
            let prev = self.stock_before(i);
            for g in self.grades.indices() {
                let k = g.get();
                let gap = (prev[k] + day.arrivals[k] - day.processing[k] - day.inventory[k]).abs();
                if worst.is_none_or(|w| gap > w.gap) {
                    worst = Some(ConservationGap {
                        day_index: i,
                        grade: g,
                        gap,
                    });
                }
            }
        }
        worst.filter(|w| w.gap > EPSILON)
    }

    /// Writes rates, inventory, blends and opening stock back into `doc`.
    /// Days missing from the document are added; other fields are untouched.
    pub fn write_into(&self, doc: &mut ScheduleDocument) {
        for day in &self.days {
            let plan = doc.daily_plan.entry(day.key.clone()).or_default();
            day.write_into(plan, &self.grades);
        }
        doc.opening_inventory = Some(
            self.grades
                .iter()
                .map(|(g, name)| (name.to_string(), self.opening[g.get()]))
                .collect(),
        );
    }

    /// A fresh document holding this schedule and the given arrivals.
    pub fn to_document(&self, vessel_arrivals: Vec<VesselArrivalDocument>) -> ScheduleDocument {
        let mut doc = ScheduleDocument {
            vessel_arrivals,
            ..Default::default()
        };
        self.write_into(&mut doc);
        doc
    }
}

fn collect_grade_names(doc: &ScheduleDocument) -> BTreeSet<&str> {
    let mut names = BTreeSet::new();
    if let Some(opening) = &doc.opening_inventory {
        names.extend(opening.keys().map(String::as_str));
    }
    for plan in doc.daily_plan.values() {
        names.extend(plan.processing_rates.keys().map(String::as_str));
        names.extend(plan.inventory_by_grade.keys().map(String::as_str));
        for b in &plan.blending_details {
            names.insert(b.primary_grade.as_str());
            if let Some(s) = b.secondary_grade.as_deref().map(str::trim) {
                if !s.is_empty() && s != "-" {
                    names.insert(s);
                }
            }
        }
    }
    for vessel in &doc.vessel_arrivals {
        names.extend(vessel.cargo.iter().map(|c| c.grade.as_str()));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::prelude::approx_eq;

    const DOC: &str = r#"{
        "daily_plan": {
            "2": {
                "processing_rates": {"A": 40, "B": 40},
                "inventory_by_grade": {"A": 110, "B": 60},
                "inventory": 170
            },
            "1": {
                "processing_rates": {"A": 50, "B": 30},
                "inventory_by_grade": {"A": 150, "B": 100},
                "inventory": 250,
                "crude_processed": 80
            }
        },
        "vessel_arrivals": [
            {"arrival_day": 1, "cargo": [{"grade": "A", "volume": 100, "origin": "Sabah"}]},
            {"arrival_day": 40, "cargo": [{"grade": "B", "volume": 300, "origin": "Sabah"}]}
        ]
    }"#;

    fn schedule() -> Schedule {
        Schedule::from_document(&ScheduleDocument::from_str(DOC).unwrap()).unwrap()
    }

    #[test]
    fn test_days_are_sorted_numerically() {
        let s = schedule();
        let keys: Vec<&str> = s.days().iter().map(DaySchedule::key).collect();
        assert_eq!(keys, vec!["1", "2"]);
    }

    #[test]
    fn test_opening_reconstructed_from_first_day() {
        let s = schedule();
        let a = s.grades().index_of("A").unwrap();
        let b = s.grades().index_of("B").unwrap();
        // A: 150 + 50 - 100, B: 100 + 30 - 0
        assert!(approx_eq(s.opening()[a.get()], 100.0));
        assert!(approx_eq(s.opening()[b.get()], 130.0));
        assert!(s.conservation_gap().is_none());
    }

    #[test]
    fn test_arrivals_outside_plan_are_ignored() {
        let s = schedule();
        let total: f64 = s.days().iter().flat_map(|d| d.arrivals()).sum();
        assert!(approx_eq(total, 100.0));
    }

    #[test]
    fn test_conservation_gap_detects_edits() {
        let mut s = schedule();
        let a = s.grades().index_of("A").unwrap();
        s.days_mut()[1].set_processing(a, 45.0);
        let gap = s.conservation_gap().unwrap();
        assert_eq!(gap.day_index, 1);
        assert!(approx_eq(gap.gap, 5.0));

        s.recompute_inventory();
        assert!(s.conservation_gap().is_none());
        assert!(approx_eq(s.days()[1].inventory_of(a), 105.0));
    }

    #[test]
    fn test_write_into_preserves_extra_fields() {
        let mut doc = ScheduleDocument::from_str(DOC).unwrap();
        let mut s = Schedule::from_document(&doc).unwrap();
        s.recompute_inventory();
        s.write_into(&mut doc);
        assert_eq!(doc.daily_plan["1"].extra["crude_processed"], 80);
        assert!(doc.opening_inventory.is_some());
        assert!(approx_eq(doc.daily_plan["2"].inventory, 170.0));
    }

    #[test]
    fn test_empty_and_bad_keys_are_input_errors() {
        let doc = ScheduleDocument::default();
        assert_eq!(Schedule::from_document(&doc), Err(InputError::EmptySchedule));

        let mut doc = ScheduleDocument::from_str(DOC).unwrap();
        let plan = doc.daily_plan["1"].clone();
        doc.daily_plan.insert("day-3".to_string(), plan);
        assert!(matches!(
            Schedule::from_document(&doc),
            Err(InputError::DayKey(_))
        ));
    }

    #[test]
    fn test_empty_schedule_has_opening_as_inventory() {
        let grades = GradeSet::from_names(["A"]);
        let s = Schedule::empty(grades, vec![20.0], 1, 3);
        assert_eq!(s.len(), 3);
        assert_eq!(s.days()[2].day(), DayPoint::new(3));
        assert!(approx_eq(s.days()[2].total_inventory(), 20.0));
    }
}

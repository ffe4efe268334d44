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

use crate::{
    grade::{GradeIndex, GradeSet},
    problem::parcel::Parcel,
};
use aegis_core::prelude::{Cost, DayDelta, DayPoint, Volume};
use std::collections::BTreeMap;

/// Origin to destination sailing times in (possibly fractional) days.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelTable {
    routes: BTreeMap<String, f64>,
}

impl TravelTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn route_key(origin: &str, destination: &str) -> String {
        format!("{} to {}", origin, destination)
    }

    #[inline]
    pub fn insert(&mut self, route: impl Into<String>, days: f64) {
        self.routes.insert(route.into(), days);
    }

    #[inline]
    pub fn days(&self, origin: &str, destination: &str) -> Option<f64> {
        self.routes
            .get(&Self::route_key(origin, destination))
            .copied()
    }

    /// Ceiling-rounded travel time, or `default_days` for unknown routes.
    pub fn travel_time(&self, origin: &str, destination: &str, default_days: f64) -> DayDelta {
        match self.days(origin, destination) {
            Some(d) => DayDelta::ceil_days(d),
            None => {
                tracing::debug!(
                    origin,
                    destination,
                    default_days,
                    "No travel time for route, using default"
                );
                DayDelta::ceil_days(default_days)
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<(String, f64)> for TravelTable {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}

/// Volume caps by number of distinct grades on board, plus the delivery limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VesselConstraints {
    one_grade_cap: Option<Volume>,
    two_grade_cap: Volume,
    three_grade_cap: Volume,
    max_deliveries: usize,
}

impl VesselConstraints {
    #[inline]
    pub fn new(two_grade_cap: Volume, three_grade_cap: Volume, max_deliveries: usize) -> Self {
        Self {
            one_grade_cap: None,
            two_grade_cap,
            three_grade_cap,
            max_deliveries,
        }
    }

    #[inline]
    pub fn with_one_grade_cap(mut self, cap: Volume) -> Self {
        self.one_grade_cap = Some(cap);
        self
    }

    #[inline]
    pub fn one_grade_cap(&self) -> Option<Volume> {
        self.one_grade_cap
    }

    #[inline]
    pub fn two_grade_cap(&self) -> Volume {
        self.two_grade_cap
    }

    #[inline]
    pub fn three_grade_cap(&self) -> Volume {
        self.three_grade_cap
    }

    #[inline]
    pub fn max_deliveries(&self) -> usize {
        self.max_deliveries
    }

    /// Volume cap for a cargo of `grade_count` distinct grades. `None` when
    /// no vessel may carry that many grades.
    #[inline]
    pub fn cap_for(&self, grade_count: usize) -> Option<Volume> {
        match grade_count {
            1 => Some(self.one_grade_cap.unwrap_or(self.two_grade_cap)),
            2 => Some(self.two_grade_cap),
            3 => Some(self.three_grade_cap),
            _ => None,
        }
    }
}

/// Freight pricing: a flat base covering the first `free_vessels` vessels,
/// then a marginal cost per extra vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreightTerms {
    base_cost: Cost,
    free_vessels: usize,
    marginal_cost: Cost,
}

impl FreightTerms {
    pub const DEFAULT_FREE_VESSELS: usize = 5;

    #[inline]
    pub fn new(base_cost: Cost, free_vessels: usize, marginal_cost: Cost) -> Self {
        Self {
            base_cost,
            free_vessels,
            marginal_cost,
        }
    }

    /// Terms whose marginal cost is the average cost of a free vessel.
    #[inline]
    pub fn with_average_marginal(base_cost: Cost, free_vessels: usize) -> Self {
        let marginal = if free_vessels == 0 {
            base_cost
        } else {
            base_cost / free_vessels as f64
        };
        Self::new(base_cost, free_vessels, marginal)
    }

    #[inline]
    pub fn base_cost(&self) -> Cost {
        self.base_cost
    }

    #[inline]
    pub fn free_vessels(&self) -> usize {
        self.free_vessels
    }

    #[inline]
    pub fn marginal_cost(&self) -> Cost {
        self.marginal_cost
    }

    #[inline]
    pub fn cost_for(&self, vessel_count: usize) -> Cost {
        if vessel_count <= self.free_vessels {
            self.base_cost
        } else {
            let extra = (vessel_count - self.free_vessels) as f64;
            self.base_cost + extra * self.marginal_cost
        }
    }
}

/// A normalized delivery program ready for vessel allocation.
///
/// Parcels are ordered by earliest arrival, ties broken by id.
#[derive(Debug, Clone)]
pub struct VesselProgram {
    grades: GradeSet,
    parcels: Vec<Parcel>,
    constraints: VesselConstraints,
    freight: FreightTerms,
    targets: BTreeMap<GradeIndex, DayPoint>,
    destination: String,
}

impl VesselProgram {
    pub fn new(
        grades: GradeSet,
        mut parcels: Vec<Parcel>,
        constraints: VesselConstraints,
        freight: FreightTerms,
        destination: impl Into<String>,
    ) -> Self {
        parcels.sort_by_key(|p| (p.earliest_arrival(), p.id()));
        Self {
            grades,
            parcels,
            constraints,
            freight,
            targets: BTreeMap::new(),
            destination: destination.into(),
        }
    }

    #[inline]
    pub fn with_targets(mut self, targets: BTreeMap<GradeIndex, DayPoint>) -> Self {
        self.targets = targets;
        self
    }

    #[inline]
    pub fn grades(&self) -> &GradeSet {
        &self.grades
    }

    #[inline]
    pub fn parcels(&self) -> &[Parcel] {
        &self.parcels
    }

    #[inline]
    pub fn constraints(&self) -> &VesselConstraints {
        &self.constraints
    }

    #[inline]
    pub fn freight(&self) -> &FreightTerms {
        &self.freight
    }

    /// Target delivery day per grade, if any were requested.
    #[inline]
    pub fn targets(&self) -> &BTreeMap<GradeIndex, DayPoint> {
        &self.targets
    }

    #[inline]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    #[inline]
    pub fn total_volume(&self) -> Volume {
        self.parcels.iter().map(Parcel::volume).sum()
    }
}

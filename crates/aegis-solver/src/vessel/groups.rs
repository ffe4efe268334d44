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

//! Candidate vessel cargoes.
//!
//! Every parcel can sail alone. Pairs and triples are kept when their
//! loading windows share a day, they carry at most three grades and their
//! volume fits the cap for that grade count.

use aegis_core::prelude::{DayPoint, EPSILON, Volume};
use aegis_model::prelude::{GradeIndex, LoadingWindow, Parcel, VesselConstraints};
use rayon::prelude::*;
use smallvec::SmallVec;

/// Parcel positions in the program's (sorted) parcel list.
pub type Members = SmallVec<[usize; 3]>;

#[derive(Debug, Clone, PartialEq)]
pub struct CargoGroup {
    members: Members,
    grades: SmallVec<[GradeIndex; 3]>,
    volume: Volume,
    loading_start: DayPoint,
    loading_end: DayPoint,
    arrival: DayPoint,
}

impl CargoGroup {
    /// Builds a group if the parcels can share a vessel. Single parcels are
    /// always accepted so that every parcel stays coverable.
    pub fn try_new(
        parcels: &[Parcel],
        members: Members,
        constraints: &VesselConstraints,
    ) -> Option<Self> {
        debug_assert!(!members.is_empty() && members.len() <= 3);

        let (loading_start, loading_end) =
            LoadingWindow::intersection(members.iter().map(|&i| parcels[i].window()))?;

        let mut grades: SmallVec<[GradeIndex; 3]> =
            members.iter().map(|&i| parcels[i].grade()).collect();
        grades.sort_unstable();
        grades.dedup();

        let volume: Volume = members.iter().map(|&i| parcels[i].volume()).sum();
        if members.len() > 1 {
            let cap = constraints.cap_for(grades.len())?;
            if volume > cap + EPSILON {
                return None;
            }
        }

        let travel = members
            .iter()
            .map(|&i| parcels[i].travel_time())
            .max()
            .unwrap_or_default();

        Some(Self {
            members,
            grades,
            volume,
            loading_start,
            loading_end,
            arrival: loading_start + travel,
        })
    }

    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    #[inline]
    pub fn grades(&self) -> &[GradeIndex] {
        &self.grades
    }

    #[inline]
    pub fn carries(&self, grade: GradeIndex) -> bool {
        self.grades.contains(&grade)
    }

    #[inline]
    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// First day every parcel of the group can load.
    #[inline]
    pub fn loading_start(&self) -> DayPoint {
        self.loading_start
    }

    /// Last day every parcel of the group can load.
    #[inline]
    pub fn loading_end(&self) -> DayPoint {
        self.loading_end
    }

    /// Latest loading start plus the longest travel time of the group.
    #[inline]
    pub fn arrival(&self) -> DayPoint {
        self.arrival
    }
}

/// Enumerates all feasible groups of one to three parcels.
///
/// Work is split over the first member in parallel; the result keeps the
/// sequential order (by first, then second, then third member).
#[tracing::instrument(level = "debug", skip_all, fields(parcels = parcels.len()))]
pub fn enumerate_groups(parcels: &[Parcel], constraints: &VesselConstraints) -> Vec<CargoGroup> {
    for p in parcels {
        if let Some(cap) = constraints.cap_for(1) {
            if p.volume() > cap + EPSILON {
                tracing::warn!(
                    parcel = %p.id(),
                    volume = p.volume(),
                    cap,
                    "Parcel exceeds the single-grade vessel cap and sails alone"
                );
            }
        }
    }

    let n = parcels.len();
    let groups: Vec<CargoGroup> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| groups_led_by(parcels, constraints, i))
        .collect();

    tracing::debug!(
        candidates = groups.len(),
        upper_bound = candidate_upper_bound(n),
        "Enumerated cargo groups"
    );
    groups
}

fn groups_led_by(parcels: &[Parcel], constraints: &VesselConstraints, i: usize) -> Vec<CargoGroup> {
    let n = parcels.len();
    let mut out = Vec::new();
    if let Some(g) = CargoGroup::try_new(parcels, SmallVec::from_slice(&[i]), constraints) {
        out.push(g);
    }
    for j in (i + 1)..n {
        // Disjoint windows stay disjoint when a third parcel joins.
        if LoadingWindow::intersection([parcels[i].window(), parcels[j].window()]).is_none() {
            continue;
        }
        if let Some(g) = CargoGroup::try_new(parcels, SmallVec::from_slice(&[i, j]), constraints) {
            out.push(g);
        }
        for k in (j + 1)..n {
            if let Some(g) =
                CargoGroup::try_new(parcels, SmallVec::from_slice(&[i, j, k]), constraints)
            {
                out.push(g);
            }
        }
    }
    out
}

/// C(n,1) + C(n,2) + C(n,3).
#[inline]
pub fn candidate_upper_bound(n: usize) -> usize {
    let n = n as u128;
    let total = n + n * n.saturating_sub(1) / 2 + n * n.saturating_sub(1) * n.saturating_sub(2) / 6;
    usize::try_from(total).unwrap_or(usize::MAX)
}

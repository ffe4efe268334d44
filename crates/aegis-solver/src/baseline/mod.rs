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

//! Baseline schedule builder.
//!
//! Receives vessels when the tank farm has room for their whole cargo and
//! runs one greedy recipe per day. The result is the starting point the
//! throughput optimizer improves on.

pub mod rates;

use aegis_core::prelude::{EPSILON, Volume};
use aegis_model::{
    err::InvalidValueError,
    prelude::{GradeSet, InputError, PlantInput, Schedule, ScheduleDocument, VesselArrivalDocument},
    schedule::doc::HeldVesselDocument,
};
use serde::{Deserialize, Serialize};

pub const HELD_AT_HORIZON_REASON: &str = "Insufficient ullage until end of simulation horizon";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineParams {
    /// Hold vessels whose cargo does not fit in the remaining ullage.
    pub enforce_ullage: bool,
}

impl Default for BaselineParams {
    fn default() -> Self {
        Self {
            enforce_ullage: true,
        }
    }
}

impl BaselineParams {
    #[inline]
    pub fn enforce_ullage(mut self, yes: bool) -> Self {
        self.enforce_ullage = yes;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineOutcome {
    schedule: Schedule,
    arrivals: Vec<VesselArrivalDocument>,
    held: Vec<HeldVesselDocument>,
}

impl BaselineOutcome {
    #[inline]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    #[inline]
    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }

    /// Vessels as actually received, on the day they were received.
    #[inline]
    pub fn arrivals(&self) -> &[VesselArrivalDocument] {
        &self.arrivals
    }

    /// Vessels still waiting for ullage when the horizon ends.
    #[inline]
    pub fn held(&self) -> &[HeldVesselDocument] {
        &self.held
    }

    pub fn to_document(&self) -> ScheduleDocument {
        let mut doc = self.schedule.to_document(self.arrivals.clone());
        doc.held_vessels = self.held.clone();
        doc
    }
}

#[derive(Debug, Clone)]
pub struct BaselineScheduler<'p> {
    plant: &'p PlantInput,
    params: BaselineParams,
}

impl<'p> BaselineScheduler<'p> {
    #[inline]
    pub fn new(plant: &'p PlantInput, params: BaselineParams) -> Self {
        Self { plant, params }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(vessels = vessels.len()))]
    pub fn build(&self, vessels: &[VesselArrivalDocument]) -> Result<BaselineOutcome, InputError> {
        let plant = self.plant;
        let first_day = plant.first_day();
        let horizon = plant.horizon_days() as i64;
        let last_day = first_day + horizon - 1;

        for vessel in vessels {
            for cargo in &vessel.cargo {
                if !cargo.volume.is_finite() || cargo.volume < 0.0 {
                    return Err(InvalidValueError::new(
                        "cargo.volume",
                        cargo.volume,
                        "must be a non-negative number",
                    )
                    .into());
                }
            }
        }

        let grades = GradeSet::from_names(
            plant
                .grade_names()
                .chain(vessels.iter().flat_map(|v| v.cargo.iter().map(|c| c.grade.as_str()))),
        );
        let mut stock = grades.zeros();
        for (name, volume) in plant.opening() {
            stock[grades.require(name)?.get()] += *volume;
        }
        let mut schedule = Schedule::empty(grades.clone(), stock.clone(), first_day, horizon as usize);

        let mut planned: Vec<VesselArrivalDocument> = Vec::with_capacity(vessels.len());
        for vessel in vessels {
            if vessel.arrival_day > last_day {
                tracing::warn!(
                    arrival_day = vessel.arrival_day,
                    last_day,
                    "Vessel arrives after the planning horizon, ignoring it"
                );
                continue;
            }
            let mut vessel = vessel.clone();
            if vessel.arrival_day < first_day {
                tracing::warn!(
                    arrival_day = vessel.arrival_day,
                    first_day,
                    "Vessel arrives before the planning horizon, receiving it on the first day"
                );
                vessel.arrival_day = first_day;
            }
            planned.push(vessel);
        }
        planned.sort_by_key(|v| v.arrival_day);

        let mut received = Vec::new();
        let mut pending: Vec<VesselArrivalDocument> = Vec::new();
        let mut next = 0;

        for (i, day) in (first_day..=last_day).enumerate() {
            // Today's planned arrivals are offered the ullage before held ones.
            let mut queue = Vec::new();
            while next < planned.len() && planned[next].arrival_day == day {
                queue.push(planned[next].clone());
                next += 1;
            }
            queue.append(&mut pending);

            for mut vessel in queue {
                let volume = vessel.total_volume();
                let on_hand: Volume = stock.iter().sum();
                let fits = on_hand + volume <= plant.maximum_inventory() + EPSILON;
                if fits || !self.params.enforce_ullage {
                    for cargo in &vessel.cargo {
                        let g = grades.require(&cargo.grade)?;
                        stock[g.get()] += cargo.volume;
                        if let Some(d) = schedule.day_mut(i) {
                            d.add_arrival(g, cargo.volume);
                        }
                    }
                    vessel.arrival_day = day;
                    received.push(vessel);
                } else {
                    let original = *vessel.original_arrival_day.get_or_insert(vessel.arrival_day);
                    vessel.days_held = Some(day - original);
                    vessel.arrival_day = day + 1;
                    tracing::warn!(
                        day,
                        original_arrival_day = original,
                        volume,
                        ullage = plant.maximum_inventory() - on_hand,
                        "Insufficient ullage, holding vessel"
                    );
                    pending.push(vessel);
                }
            }

            let plan = rates::plan_day(&stock, &grades, plant);
            for (s, p) in stock.iter_mut().zip(&plan.processing) {
                *s = (*s - *p).max(0.0);
            }
            let total: Volume = stock.iter().sum();
            if total > plant.maximum_inventory() + EPSILON {
                tracing::warn!(
                    day,
                    total,
                    maximum = plant.maximum_inventory(),
                    "Total inventory exceeds maximum capacity"
                );
            }
            if let Some(d) = schedule.day_mut(i) {
                d.set_plan(plan.processing, plan.blending);
            }
        }
        schedule.recompute_inventory();

        let held: Vec<HeldVesselDocument> = pending
            .into_iter()
            .map(|v| HeldVesselDocument {
                original_arrival_day: v.original_arrival_day.unwrap_or(v.arrival_day),
                days_held: v.days_held.unwrap_or(0),
                cargo: v.cargo,
                ldr_text: v.ldr_text,
                reason: HELD_AT_HORIZON_REASON.to_string(),
            })
            .collect();

        tracing::info!(
            days = schedule.len(),
            received = received.len(),
            held = held.len(),
            "Baseline schedule built"
        );

        Ok(BaselineOutcome {
            schedule,
            arrivals: received,
            held,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_model::{
        prelude::{Pairing, Ratio},
        schedule::doc::CargoDocument,
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9
    }

    fn vessel(day: i64, grade: &str, volume: f64) -> VesselArrivalDocument {
        VesselArrivalDocument {
            arrival_day: day,
            cargo: vec![CargoDocument {
                grade: grade.to_string(),
                volume,
                origin: "Port".to_string(),
                extra: Default::default(),
            }],
            ..Default::default()
        }
    }

    fn plant(max_inventory: f64, days: u32) -> PlantInput {
        PlantInput::new(95.0, max_inventory)
            .with_pairing(Pairing::new("A".to_string(), None, Ratio::pure(), 95.0))
            .with_margin("A", 5.0)
            .with_opening("A", 100.0)
            .with_horizon(1, days)
    }

    #[test]
    fn test_receives_and_processes() {
        let plant = plant(1000.0, 3);
        let outcome = BaselineScheduler::new(&plant, BaselineParams::default())
            .build(&[vessel(2, "A", 200.0)])
            .unwrap();
        let s = outcome.schedule();
        assert_eq!(s.len(), 3);
        let a = s.grades().index_of("A").unwrap();
        assert!(close(s.days()[0].processing_of(a), 95.0));
        assert!(close(s.days()[1].arrival(a), 200.0));
        assert!(close(s.days()[1].processing_of(a), 95.0));
        assert!(close(s.days()[2].inventory_of(a), 15.0));
        assert!(s.conservation_gap().is_none());
        assert_eq!(outcome.arrivals().len(), 1);
        assert!(outcome.held().is_empty());
    }

    #[test]
    fn test_vessel_held_until_ullage_frees_up() {
        // 100 on hand, cap 150: a 100 kb vessel fits only after a day's run.
        let plant = plant(150.0, 3);
        let outcome = BaselineScheduler::new(&plant, BaselineParams::default())
            .build(&[vessel(1, "A", 100.0)])
            .unwrap();
        let arrivals = outcome.arrivals();
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].arrival_day, 2);
        assert_eq!(arrivals[0].original_arrival_day, Some(1));
        assert_eq!(arrivals[0].days_held, Some(0));
        assert!(outcome.schedule().conservation_gap().is_none());
    }

    #[test]
    fn test_vessel_held_past_horizon_is_reported() {
        let plant = PlantInput::new(95.0, 150.0)
            .with_opening("B", 140.0)
            .with_horizon(1, 1);
        let outcome = BaselineScheduler::new(&plant, BaselineParams::default())
            .build(&[vessel(1, "A", 50.0)])
            .unwrap();
        assert!(outcome.arrivals().is_empty());
        assert_eq!(outcome.held().len(), 1);
        assert_eq!(outcome.held()[0].reason, HELD_AT_HORIZON_REASON);
        assert_eq!(outcome.held()[0].original_arrival_day, 1);

        let doc = outcome.to_document();
        assert_eq!(doc.held_vessels.len(), 1);
        assert!(doc.vessel_arrivals.is_empty());
        assert_eq!(doc.opening_inventory.unwrap()["B"], 140.0);
    }

    #[test]
    fn test_ullage_can_be_ignored() {
        let plant = plant(150.0, 2);
        let outcome = BaselineScheduler::new(&plant, BaselineParams::default().enforce_ullage(false))
            .build(&[vessel(1, "A", 100.0)])
            .unwrap();
        assert_eq!(outcome.arrivals()[0].arrival_day, 1);
        assert!(outcome.arrivals()[0].original_arrival_day.is_none());
    }

    #[test]
    fn test_vessels_outside_horizon() {
        let plant = plant(1000.0, 2);
        let outcome = BaselineScheduler::new(&plant, BaselineParams::default())
            .build(&[vessel(0, "A", 10.0), vessel(9, "A", 10.0)])
            .unwrap();
        assert_eq!(outcome.arrivals().len(), 1);
        assert_eq!(outcome.arrivals()[0].arrival_day, 1);
    }

    #[test]
    fn test_negative_cargo_is_rejected() {
        let plant = plant(1000.0, 2);
        let err = BaselineScheduler::new(&plant, BaselineParams::default())
            .build(&[vessel(1, "A", -1.0)])
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidValue(_)));
    }
}

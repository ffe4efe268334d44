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

//! Heuristic rate smoothing.
//!
//! Lifts days that run below the minimum threshold by moving part of one
//! grade's processing over from the previous day, as long as that day stays
//! comfortably above the threshold.

use aegis_core::prelude::{EPSILON, Volume};
use aegis_model::prelude::{BlendDetail, GradeIndex, InputError, Schedule, ScheduleDocument};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    pub min_threshold: Volume,
    /// The previous day must run above `min_threshold + headroom` to lend.
    pub headroom: Volume,
    /// Grades below this rate on the previous day are not borrowed from.
    pub min_borrow_rate: Volume,
    /// Largest share of a grade's previous-day rate that can be moved.
    pub borrow_fraction: f64,
    /// Capacity recorded on solo blends created by a move.
    pub default_capacity: Volume,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            min_threshold: 80.0,
            headroom: 10.0,
            min_borrow_rate: 5.0,
            borrow_fraction: 0.3,
            default_capacity: 95.0,
        }
    }
}

impl SmoothingParams {
    #[inline]
    pub fn min_threshold(mut self, v: Volume) -> Self {
        self.min_threshold = v;
        self
    }

    #[inline]
    pub fn headroom(mut self, v: Volume) -> Self {
        self.headroom = v;
        self
    }
}

/// One volume move from the previous day into `day_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub day_index: usize,
    pub grade: GradeIndex,
    pub volume: Volume,
}

#[derive(Debug, Clone, Default)]
pub struct RateSmoother {
    params: SmoothingParams,
}

impl RateSmoother {
    #[inline]
    pub fn new(params: SmoothingParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &SmoothingParams {
        &self.params
    }

    /// Smooths `schedule` in place and returns the moves made.
    #[tracing::instrument(level = "debug", skip_all, fields(days = schedule.len()))]
    pub fn smooth(&self, schedule: &mut Schedule) -> Vec<Adjustment> {
        let p = &self.params;
        let mut moves = Vec::new();

        for d in 1..schedule.len() {
            let days = schedule.days_mut();
            let (before, after) = days.split_at_mut(d);
            let prev = &mut before[d - 1];
            let cur = &mut after[0];

            let current = cur.total_processing();
            let previous = prev.total_processing();
            if current >= p.min_threshold || previous <= p.min_threshold + p.headroom {
                continue;
            }

            // Prefer grades already running today, then the largest lender.
            let Some(grade) = (0..prev.processing().len())
                .map(GradeIndex::new)
                .filter(|g| prev.processing_of(*g) >= p.min_borrow_rate)
                .max_by(|a, b| {
                    let key = |g: GradeIndex| (cur.processing_of(g) > EPSILON, prev.processing_of(g));
                    let (ra, la) = key(*a);
                    let (rb, lb) = key(*b);
                    ra.cmp(&rb)
                        .then(la.total_cmp(&lb))
                        .then(b.get().cmp(&a.get()))
                })
            else {
                continue;
            };

            let volume = (p.min_threshold - current)
                .min(p.borrow_fraction * prev.processing_of(grade))
                .min(previous - p.min_threshold);
            if volume <= EPSILON {
                continue;
            }

            prev.set_processing(grade, prev.processing_of(grade) - volume);
            debit(prev.blending_mut(), grade, volume);

            cur.set_processing(grade, cur.processing_of(grade) + volume);
            let blends = cur.blending_mut();
            match blends.iter_mut().find(|b| b.uses(grade)) {
                Some(b) => {
                    b.add_rate(grade, volume);
                }
                None => blends.push(BlendDetail::solo(grade, volume, Some(p.default_capacity))),
            }

            tracing::debug!(
                day = cur.day().value(),
                grade = grade.get(),
                volume,
                "Moved volume from previous day"
            );
            moves.push(Adjustment {
                day_index: d,
                grade,
                volume,
            });
        }

        if !moves.is_empty() {
            schedule.recompute_inventory();
        }
        tracing::info!(adjustments = moves.len(), "Rates smoothed");
        moves
    }

    /// Smooths a schedule document in place and stamps `rate_optimization`.
    pub fn smooth_document(&self, doc: &mut ScheduleDocument) -> Result<usize, InputError> {
        let mut schedule = Schedule::from_document(doc)?;
        let moves = self.smooth(&mut schedule);
        schedule.write_into(doc);
        doc.set_metadata(
            "rate_optimization",
            serde_json::json!({
                "min_threshold": self.params.min_threshold,
                "optimized_on": chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                "adjustments": moves.len(),
            }),
        );
        Ok(moves.len())
    }
}

/// Removes `volume` of `grade` from the blends that run it, in order.
fn debit(blends: &mut [BlendDetail], grade: GradeIndex, volume: Volume) {
    let mut left = volume;
    for b in blends.iter_mut().filter(|b| b.uses(grade)) {
        if left <= EPSILON {
            break;
        }
        let take = b.rate_of(grade).min(left);
        b.add_rate(grade, -take);
        left -= take;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_model::prelude::GradeSet;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9
    }

    fn schedule(rates: &[[f64; 2]]) -> Schedule {
        let grades = GradeSet::from_names(["A", "B"]);
        let mut s = Schedule::empty(grades, vec![1000.0, 1000.0], 1, rates.len());
        for (day, r) in s.days_mut().iter_mut().zip(rates) {
            let mut blends = Vec::new();
            for (k, rate) in r.iter().enumerate() {
                if *rate > 0.0 {
                    blends.push(BlendDetail::solo(GradeIndex::new(k), *rate, Some(95.0)));
                }
            }
            day.set_plan(r.to_vec(), blends);
        }
        s.recompute_inventory();
        s
    }

    #[test]
    fn test_borrows_from_grade_running_today() {
        let mut s = schedule(&[[60.0, 40.0], [0.0, 70.0]]);
        let moves = RateSmoother::default().smooth(&mut s);
        assert_eq!(moves.len(), 1);
        // B runs today, so it lends: min(10, 0.3 * 40, 100 - 80) = 10.
        assert_eq!(moves[0].grade, GradeIndex::new(1));
        assert!(close(moves[0].volume, 10.0));
        assert!(close(s.days()[0].processing_of(GradeIndex::new(1)), 30.0));
        assert!(close(s.days()[1].total_processing(), 80.0));
        assert!(close(s.days()[0].blending()[1].total_rate(), 30.0));
        assert!(close(s.days()[1].blending()[0].total_rate(), 80.0));
        assert!(s.conservation_gap().is_none());
    }

    #[test]
    fn test_new_solo_blend_when_grade_not_running() {
        let mut s = schedule(&[[100.0, 0.0], [0.0, 75.0]]);
        let moves = RateSmoother::default().smooth(&mut s);
        assert_eq!(moves[0].grade, GradeIndex::new(0));
        assert!(close(moves[0].volume, 5.0));
        let today = &s.days()[1];
        assert_eq!(today.blending().len(), 2);
        assert_eq!(today.blending()[1].capacity_limit(), Some(95.0));
        assert!(close(today.processing_of(GradeIndex::new(0)), 5.0));
    }

    #[test]
    fn test_lender_without_headroom_is_left_alone() {
        let mut s = schedule(&[[85.0, 0.0], [50.0, 0.0]]);
        let before = s.clone();
        assert!(RateSmoother::default().smooth(&mut s).is_empty());
        assert_eq!(s, before);
    }

    #[test]
    fn test_borrow_is_capped_by_fraction_and_lender_floor() {
        let mut s = schedule(&[[95.0, 0.0], [20.0, 0.0]]);
        let moves = RateSmoother::default().smooth(&mut s);
        // Shortfall 60, 30% of 95 is 28.5, lender floor leaves 15.
        assert!(close(moves[0].volume, 15.0));
        assert!(close(s.days()[0].total_processing(), 80.0));
        assert!(close(s.days()[1].total_processing(), 35.0));
    }

    #[test]
    fn test_document_is_stamped() {
        let mut doc: ScheduleDocument = serde_json::from_value(serde_json::json!({
            "opening_inventory": {"A": 500.0},
            "daily_plan": {
                "1": {"processing_rates": {"A": 95.0}},
                "2": {"processing_rates": {"A": 70.0}},
            }
        }))
        .unwrap();
        let n = RateSmoother::default().smooth_document(&mut doc).unwrap();
        assert_eq!(n, 1);
        assert!((doc.daily_plan["2"].processing_rates["A"] - 80.0).abs() < 1e-9);
        assert_eq!(doc.metadata("rate_optimization").unwrap()["min_threshold"], 80.0);
    }
}

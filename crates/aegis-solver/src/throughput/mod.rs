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

//! Throughput optimization.
//!
//! Chooses one recipe per grade and day plus recipe rates so that total
//! processing over the horizon is maximal, every day runs at least
//! `min_threshold`, consecutive days differ by at most `max_daily_change`
//! and no grade's inventory goes negative. A failed solve leaves the
//! schedule untouched.

mod extract;
mod model;
pub mod vars;

use crate::{
    err::SolveFailure, recipe::catalogue::{DEFAULT_RECIPE_CAPACITY, RecipeCatalogue},
    session::SolverSession,
};
use aegis_core::prelude::{EPSILON, Volume};
use aegis_model::prelude::{InputError, Schedule, ScheduleDocument};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThroughputParams {
    pub min_threshold: Volume,
    pub max_daily_change: Volume,
    pub time_limit_secs: u64,
    /// Ceiling of synthesized pure recipes and of recorded ones without a limit.
    pub default_capacity: Volume,
    /// Force `rate <= capacity * select` so unselected recipes stay idle.
    pub link_rate_to_selection: bool,
    /// Upper bound on the summed inventory of all grades, per day.
    pub max_total_inventory: Option<Volume>,
    /// Upper bound on a day's total processing.
    pub plant_capacity: Option<Volume>,
    /// When false, every day after the first can only process stock held at
    /// the end of the previous day.
    pub process_same_day_arrivals: bool,
}

impl Default for ThroughputParams {
    fn default() -> Self {
        Self {
            min_threshold: 80.0,
            max_daily_change: 10.0,
            time_limit_secs: 120,
            default_capacity: DEFAULT_RECIPE_CAPACITY,
            link_rate_to_selection: true,
            max_total_inventory: None,
            plant_capacity: None,
            process_same_day_arrivals: true,
        }
    }
}

impl ThroughputParams {
    #[inline]
    pub fn min_threshold(mut self, v: Volume) -> Self {
        self.min_threshold = v;
        self
    }

    #[inline]
    pub fn max_daily_change(mut self, v: Volume) -> Self {
        self.max_daily_change = v;
        self
    }

    #[inline]
    pub fn time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    #[inline]
    pub fn plant_capacity(mut self, cap: Option<Volume>) -> Self {
        self.plant_capacity = cap;
        self
    }

    #[inline]
    pub fn max_total_inventory(mut self, cap: Option<Volume>) -> Self {
        self.max_total_inventory = cap;
        self
    }

    #[inline]
    pub fn process_same_day_arrivals(mut self, yes: bool) -> Self {
        self.process_same_day_arrivals = yes;
        self
    }

    #[inline]
    pub fn link_rate_to_selection(mut self, yes: bool) -> Self {
        self.link_rate_to_selection = yes;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputOutcome {
    objective_value: Volume,
    day_totals: Vec<Volume>,
    selections: Vec<Vec<Option<usize>>>,
    selection_counts: Vec<Vec<usize>>,
}

impl ThroughputOutcome {
    /// Total processing over the horizon.
    #[inline]
    pub fn objective_value(&self) -> Volume {
        self.objective_value
    }

    #[inline]
    pub fn day_totals(&self) -> &[Volume] {
        &self.day_totals
    }

    /// Selected recipe index per day and grade.
    #[inline]
    pub fn selections(&self) -> &[Vec<Option<usize>>] {
        &self.selections
    }

    /// Number of recipes switched on per day and grade.
    #[inline]
    pub fn selection_counts(&self) -> &[Vec<usize>] {
        &self.selection_counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ThroughputReport {
    Optimal {
        objective_value: Volume,
        day_totals: Vec<Volume>,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ThroughputOptimizer {
    params: ThroughputParams,
}

impl ThroughputOptimizer {
    #[inline]
    pub fn new(params: ThroughputParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ThroughputParams {
        &self.params
    }

    /// Optimizes `schedule` in place. On failure nothing is changed.
    #[tracing::instrument(level = "debug", skip_all, fields(days = schedule.len()))]
    pub fn optimize(&self, schedule: &mut Schedule) -> Result<ThroughputOutcome, SolveFailure> {
        if schedule.grades().is_empty() || schedule.is_empty() {
            if self.params.min_threshold > EPSILON && !schedule.is_empty() {
                tracing::warn!("Schedule has no grades to process, threshold cannot be met");
                return Err(SolveFailure::Infeasible);
            }
            return Ok(ThroughputOutcome {
                objective_value: 0.0,
                day_totals: vec![0.0; schedule.len()],
                selections: vec![Vec::new(); schedule.len()],
                selection_counts: vec![Vec::new(); schedule.len()],
            });
        }

        let catalogue = RecipeCatalogue::from_schedule(schedule, self.params.default_capacity);
        let session = SolverSession::new("throughput", self.params.time_limit_secs);
        let model = model::build(&session, schedule, &catalogue, &self.params);

        let sol = match session.solve(model.problem) {
            Ok(sol) => sol,
            Err(failure) => {
                tracing::warn!(%failure, "Throughput optimization failed, schedule left unchanged");
                return Err(failure);
            }
        };

        let extracted = extract::extract(&sol, &model.recipes, &catalogue, schedule.grades());
        let selections = extracted.selections.clone();
        let selection_counts = extracted.selection_counts.clone();
        extracted.apply(schedule);

        let day_totals: Vec<Volume> = schedule
            .days()
            .iter()
            .map(|d| d.total_processing())
            .collect();
        let objective_value = day_totals.iter().sum();

        tracing::info!(
            objective_value,
            days = day_totals.len(),
            elapsed_ms = session.elapsed().as_millis() as u64,
            "Throughput optimized"
        );

        Ok(ThroughputOutcome {
            objective_value,
            day_totals,
            selections,
            selection_counts,
        })
    }

    /// Optimizes a schedule document in place and stamps `lp_optimization`.
    ///
    /// Malformed documents are errors; solver failures are reported and leave
    /// the document as it was.
    pub fn optimize_document(
        &self,
        doc: &mut ScheduleDocument,
    ) -> Result<ThroughputReport, InputError> {
        let mut schedule = Schedule::from_document(doc)?;
        match self.optimize(&mut schedule) {
            Ok(outcome) => {
                schedule.write_into(doc);
                doc.set_metadata(
                    "lp_optimization",
                    serde_json::json!({
                        "optimized_on": chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                        "objective_value": outcome.objective_value,
                        "min_threshold": self.params.min_threshold,
                        "max_daily_change": self.params.max_daily_change,
                    }),
                );
                Ok(ThroughputReport::Optimal {
                    objective_value: outcome.objective_value,
                    day_totals: outcome.day_totals,
                })
            }
            Err(failure) => Ok(ThroughputReport::Failed {
                message: format!("Throughput optimization failed: {}", failure),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-5
    }

    fn doc(value: serde_json::Value) -> ScheduleDocument {
        serde_json::from_value(value).unwrap()
    }

    fn days(n: usize, grades: &[&str]) -> serde_json::Value {
        let mut plan = serde_json::Map::new();
        for d in 1..=n {
            let rates: serde_json::Map<String, serde_json::Value> =
                grades.iter().map(|g| (g.to_string(), json!(0.0))).collect();
            plan.insert(d.to_string(), json!({ "processing_rates": rates }));
        }
        serde_json::Value::Object(plan)
    }

    fn optimizer() -> ThroughputOptimizer {
        ThroughputOptimizer::new(ThroughputParams::default().time_limit_secs(30))
    }

    fn assert_feasible(schedule: &Schedule, params: &ThroughputParams) {
        assert!(schedule.conservation_gap().is_none());
        let totals: Vec<f64> = schedule.days().iter().map(|d| d.total_processing()).collect();
        for (i, t) in totals.iter().enumerate() {
            assert!(*t >= params.min_threshold - 1e-6, "day {i} below threshold: {t}");
            if i > 0 {
                assert!((t - totals[i - 1]).abs() <= params.max_daily_change + 1e-6);
            }
        }
        for day in schedule.days() {
            assert!(day.inventory().iter().all(|v| *v >= -1e-6));
        }
    }

    #[test]
    fn test_single_grade_with_ample_stock_runs_at_capacity() {
        let mut d = doc(json!({
            "opening_inventory": {"A": 1000.0},
            "daily_plan": days(3, &["A"]),
        }));
        let report = optimizer().optimize_document(&mut d).unwrap();
        let ThroughputReport::Optimal {
            objective_value,
            day_totals,
        } = report
        else {
            panic!("expected optimal report");
        };
        assert!(close(objective_value, 285.0));
        assert!(day_totals.iter().all(|t| close(*t, 95.0)));
        assert!(close(d.daily_plan["3"].inventory_by_grade["A"], 715.0));
        let blends = &d.daily_plan["2"].blending_details;
        assert_eq!(blends.len(), 1);
        assert_eq!(blends[0].ratio.as_deref(), Some("1.00:0.00"));
        assert_eq!(blends[0].capacity_limit, Some(95.0));

        let meta = d.metadata("lp_optimization").unwrap();
        assert!(close(meta["objective_value"].as_f64().unwrap(), 285.0));
        assert_eq!(meta["min_threshold"], 80.0);
    }

    #[test]
    fn test_rerun_on_optimal_output_keeps_rates() {
        let mut d = doc(json!({
            "opening_inventory": {"A": 1000.0},
            "daily_plan": days(4, &["A"]),
        }));
        optimizer().optimize_document(&mut d).unwrap();
        let first: Vec<f64> = (1..=4).map(|k| d.daily_plan[&k.to_string()].processing_rates["A"]).collect();

        optimizer().optimize_document(&mut d).unwrap();
        let second: Vec<f64> = (1..=4).map(|k| d.daily_plan[&k.to_string()].processing_rates["A"]).collect();
        for (a, b) in first.iter().zip(&second) {
            assert!(close(*a, *b));
        }
    }

    #[test]
    fn test_rerun_keeps_rates_of_uneven_blend() {
        // B can only run alongside A in the 1:2 blend, plus one unit on its own.
        let mut plan = days(1, &["A", "B"]);
        plan["1"]["blending_details"] = json!([
            {
                "primary_grade": "A", "secondary_grade": "B",
                "primary_rate": 30.0, "secondary_rate": 60.0,
                "ratio": "1:2", "capacity_limit": 90.0
            },
            {"primary_grade": "B", "primary_rate": 1.0, "capacity_limit": 1.0}
        ]);
        let mut d = doc(json!({
            "opening_inventory": {"A": 30.0, "B": 61.0},
            "daily_plan": plan,
        }));

        let rates = |d: &ScheduleDocument| -> Vec<f64> {
            let day = &d.daily_plan["1"];
            let mut out = vec![day.processing_rates["A"], day.processing_rates["B"]];
            for b in &day.blending_details {
                out.push(b.primary_rate);
                out.push(b.secondary_rate);
            }
            out
        };

        let report = optimizer().optimize_document(&mut d).unwrap();
        assert!(matches!(report, ThroughputReport::Optimal { .. }));
        let first = rates(&d);
        assert_eq!(first.len(), 6);
        assert!(close(first[0], 30.0));
        assert!(close(first[1], 61.0));
        assert_eq!(
            d.daily_plan["1"].blending_details[0].ratio.as_deref(),
            Some("0.33:0.67")
        );

        optimizer().optimize_document(&mut d).unwrap();
        let second = rates(&d);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert!(close(*a, *b), "{a} became {b}");
        }
    }

    #[test]
    fn test_empty_stock_fails_and_leaves_document_unchanged() {
        let mut d = doc(json!({
            "opening_inventory": {"A": 0.0},
            "daily_plan": days(1, &["A"]),
        }));
        let before = d.clone();
        let report = optimizer().optimize_document(&mut d).unwrap();
        assert!(matches!(report, ThroughputReport::Failed { .. }));
        assert_eq!(d, before);
    }

    #[test]
    fn test_blended_plan_respects_all_constraints() {
        let blend = json!([{
            "primary_grade": "A", "secondary_grade": "B",
            "primary_rate": 54.0, "secondary_rate": 36.0,
            "ratio": "0.60:0.40", "capacity_limit": 90.0
        }]);
        let mut plan = days(4, &["A", "B"]);
        for k in ["1", "2", "3", "4"] {
            plan[k]["blending_details"] = blend.clone();
        }
        let d = doc(json!({
            "opening_inventory": {"A": 200.0, "B": 100.0},
            "daily_plan": plan,
            "vessel_arrivals": [{"arrival_day": 2, "cargo": [{"grade": "A", "volume": 150.0}]}],
        }));
        let mut schedule = Schedule::from_document(&d).unwrap();
        let opt = optimizer();
        let outcome = opt.optimize(&mut schedule).unwrap();

        assert_feasible(&schedule, opt.params());
        // One recipe selected per grade and day.
        for day in outcome.selections() {
            assert_eq!(day.len(), 2);
            assert!(day.iter().all(Option::is_some));
        }
        for day in outcome.selection_counts() {
            assert_eq!(day, &vec![1, 1]);
        }
        // Blends match the processing they produce.
        for day in schedule.days() {
            for g in schedule.grades().indices() {
                let from_blends: f64 = day.blending().iter().map(|b| b.rate_of(g)).sum();
                assert!(close(from_blends, day.processing_of(g)));
            }
        }
        assert!(close(
            outcome.objective_value(),
            outcome.day_totals().iter().sum::<f64>()
        ));
    }

    #[test]
    fn test_previous_day_stock_rule_limits_later_days() {
        let base = json!({
            "opening_inventory": {"A": 0.0},
            "daily_plan": days(2, &["A"]),
            "vessel_arrivals": [
                {"arrival_day": 1, "cargo": [{"grade": "A", "volume": 100.0}]},
                {"arrival_day": 2, "cargo": [{"grade": "A", "volume": 200.0}]},
            ],
        });
        let params = ThroughputParams::default().min_threshold(0.0);

        // Day 2 may only draw on day 1's closing stock.
        let mut strict = Schedule::from_document(&doc(base.clone())).unwrap();
        let outcome = ThroughputOptimizer::new(params.clone().process_same_day_arrivals(false))
            .optimize(&mut strict)
            .unwrap();
        assert!(close(outcome.objective_value(), 100.0));

        let mut relaxed = Schedule::from_document(&doc(base)).unwrap();
        let outcome = ThroughputOptimizer::new(params).optimize(&mut relaxed).unwrap();
        assert!(close(outcome.objective_value(), 190.0));
    }

    #[test]
    fn test_plant_capacity_caps_daily_total() {
        let mut schedule = Schedule::from_document(&doc(json!({
            "opening_inventory": {"A": 1000.0},
            "daily_plan": days(3, &["A"]),
        })))
        .unwrap();
        let outcome = ThroughputOptimizer::new(ThroughputParams::default().plant_capacity(Some(85.0)))
            .optimize(&mut schedule)
            .unwrap();
        assert!(outcome.day_totals().iter().all(|t| close(*t, 85.0)));
    }

    #[test]
    fn test_inventory_cap_can_make_plan_infeasible() {
        let mut schedule = Schedule::from_document(&doc(json!({
            "opening_inventory": {"A": 1000.0},
            "daily_plan": days(2, &["A"]),
        })))
        .unwrap();
        let before = schedule.clone();
        let err = ThroughputOptimizer::new(
            ThroughputParams::default().max_total_inventory(Some(900.0)),
        )
        .optimize(&mut schedule)
        .unwrap_err();
        assert_eq!(err, SolveFailure::Infeasible);
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_sample_schedule_instance() {
        use std::path::{Path, PathBuf};

        fn find_instances_dir() -> Option<PathBuf> {
            let mut cur: Option<&Path> = Some(Path::new(env!("CARGO_MANIFEST_DIR")));
            while let Some(p) = cur {
                let cand = p.join("instances");
                if cand.is_dir() {
                    return Some(cand);
                }
                cur = p.parent();
            }
            None
        }

        let dir = find_instances_dir().expect("no instances directory");
        let mut d = ScheduleDocument::from_path(dir.join("schedule_sample.json")).unwrap();
        let opt = optimizer();
        let report = opt.optimize_document(&mut d).unwrap();
        assert!(matches!(report, ThroughputReport::Optimal { .. }));

        let schedule = Schedule::from_document(&d).unwrap();
        assert_feasible(&schedule, opt.params());
        assert_eq!(d.vessel_arrivals.len(), 1);
        assert!(d.metadata("lp_optimization").is_some());
    }

    #[test]
    fn test_malformed_document_is_an_input_error() {
        let mut d = doc(json!({ "daily_plan": {} }));
        assert_eq!(
            optimizer().optimize_document(&mut d),
            Err(InputError::EmptySchedule)
        );
    }
}

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

//! The per-day throughput MILP.
//!
//! Variables per day `d`:
//! * `select[d][r]` binary, exactly one recipe per primary grade,
//! * `rate[d][r]` in `[0, capacity_r]`,
//! * `inventory[d][g] >= 0`.
//!
//! Processing of a grade is the ratio-weighted sum of the rates of the
//! recipes that use it; the objective is total processing over all days.

use crate::{
    recipe::catalogue::RecipeCatalogue,
    session::SolverSession,
    throughput::{
        ThroughputParams,
        vars::{DayGradeTable, RecipeVars},
    },
};
use aegis_model::prelude::Schedule;
use good_lp::solvers::highs::HighsProblem;
use good_lp::*;

pub(crate) struct ThroughputModel {
    pub problem: HighsProblem,
    pub recipes: RecipeVars,
}

#[tracing::instrument(level = "debug", skip_all, fields(days = schedule.len()))]
pub(crate) fn build(
    session: &SolverSession,
    schedule: &Schedule,
    catalogue: &RecipeCatalogue,
    params: &ThroughputParams,
) -> ThroughputModel {
    let n_days = schedule.len();
    let grades = schedule.grades();
    let n_grades = grades.len();

    let mut vars = variables!();
    let mut recipes = RecipeVars::default();
    for d in 0..n_days {
        let day = catalogue.day(d);
        let select = (0..day.len())
            .map(|r| vars.add(variable().binary().name(format!("sel_{d}_{r}"))))
            .collect();
        let rate = day
            .iter()
            .enumerate()
            .map(|(r, recipe)| {
                vars.add(
                    variable()
                        .min(0.0)
                        .max(recipe.capacity())
                        .name(format!("rate_{d}_{r}")),
                )
            })
            .collect();
        recipes.push_day(select, rate);
    }
    let inventory = DayGradeTable::from_fn(n_days, n_grades, |d, g| {
        vars.add(variable().min(0.0).name(format!("inv_{d}_{}", g.get())))
    });

    // processing[d][g] as an expression over the day's recipe rates.
    let processing = DayGradeTable::from_fn(n_days, n_grades, |d, g| {
        catalogue
            .day(d)
            .iter()
            .enumerate()
            .filter(|(_, recipe)| recipe.uses(g))
            .fold(Expression::from(0.0), |acc, (r, recipe)| {
                acc + recipe.share_of(g) * recipes.rate(d, r)
            })
    });
    // Shares of a recipe sum to one, so a day's total is the sum of its rates.
    let totals: Vec<Expression> = (0..n_days)
        .map(|d| {
            recipes
                .rates(d)
                .iter()
                .fold(Expression::from(0.0), |acc, v| acc + *v)
        })
        .collect();

    let objective = totals
        .iter()
        .fold(Expression::from(0.0), |acc, t| acc + t.clone());
    let mut problem = session.maximise(vars, objective);

    for d in 0..n_days {
        let day = catalogue.day(d);

        // Exactly one recipe per primary grade.
        for g in grades.indices() {
            let sum = catalogue
                .for_primary(d, g)
                .fold(Expression::from(0.0), |acc, r| acc + recipes.select(d, r));
            problem.add_constraint(sum.eq(1.0));
        }

        if params.link_rate_to_selection {
            for (r, recipe) in day.iter().enumerate() {
                problem.add_constraint(
                    Expression::from(recipes.rate(d, r))
                        .leq(recipe.capacity() * recipes.select(d, r)),
                );
            }
        }

        // Inventory balance; day 0 is anchored to the opening stock.
        let arrivals = schedule.days()[d].arrivals();
        for g in grades.indices() {
            let k = g.get();
            let previous: Expression = if d == 0 {
                Expression::from(schedule.opening()[k])
            } else {
                Expression::from(inventory[(d - 1, g)])
            };
            problem.add_constraint(
                Expression::from(inventory[(d, g)])
                    .eq(previous.clone() + arrivals[k] - processing[(d, g)].clone()),
            );
            if d > 0 && !params.process_same_day_arrivals {
                problem.add_constraint(processing[(d, g)].clone().leq(previous));
            }
        }

        problem.add_constraint(totals[d].clone().geq(params.min_threshold));

        if let Some(cap) = params.plant_capacity {
            problem.add_constraint(totals[d].clone().leq(cap));
        }

        if let Some(cap) = params.max_total_inventory {
            let stock = inventory
                .row(d)
                .iter()
                .fold(Expression::from(0.0), |acc, v| acc + *v);
            problem.add_constraint(stock.leq(cap));
        }

        if d > 0 {
            let change = totals[d].clone() - totals[d - 1].clone();
            problem.add_constraint(change.clone().leq(params.max_daily_change));
            problem.add_constraint(change.geq(-params.max_daily_change));
        }
    }

    tracing::debug!(
        grades = n_grades,
        recipes = catalogue.len(),
        "Built throughput model"
    );

    ThroughputModel { problem, recipes }
}

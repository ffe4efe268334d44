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

use crate::{recipe::catalogue::RecipeCatalogue, throughput::vars::RecipeVars};
use aegis_core::prelude::{EPSILON, Volume};
use aegis_model::prelude::{BlendDetail, GradeSet, Schedule};
use good_lp::Solution;

/// The solved plan, ready to be written into a schedule.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Extracted {
    pub processing: Vec<Vec<Volume>>,
    pub blending: Vec<Vec<BlendDetail>>,
    /// Selected recipe (index within the day) per grade and day.
    pub selections: Vec<Vec<Option<usize>>>,
    /// Number of recipes switched on per grade and day.
    pub selection_counts: Vec<Vec<usize>>,
}

impl Extracted {
    /// Rewrites rates and blends in place and rebuilds inventory.
    pub fn apply(self, schedule: &mut Schedule) {
        for ((day, processing), blending) in schedule
            .days_mut()
            .iter_mut()
            .zip(self.processing)
            .zip(self.blending)
        {
            day.set_plan(processing, blending);
        }
        schedule.recompute_inventory();
    }
}

pub(crate) fn extract<S: Solution>(
    sol: &S,
    recipes: &RecipeVars,
    catalogue: &RecipeCatalogue,
    grades: &GradeSet,
) -> Extracted {
    let n_days = recipes.days();
    let mut processing = Vec::with_capacity(n_days);
    let mut blending = Vec::with_capacity(n_days);
    let mut selections = Vec::with_capacity(n_days);
    let mut selection_counts = Vec::with_capacity(n_days);

    for d in 0..n_days {
        let mut day_processing = grades.zeros();
        let mut day_blending = Vec::new();

        for (r, recipe) in catalogue.day(d).iter().enumerate() {
            let rate = sol.value(recipes.rate(d, r));
            if rate <= EPSILON {
                continue;
            }
            let detail = BlendDetail::from_total(
                recipe.primary(),
                recipe.secondary(),
                recipe.ratio(),
                rate,
                Some(recipe.capacity()),
            );
            day_processing[recipe.primary().get()] += detail.primary_rate();
            if let Some(s) = recipe.secondary() {
                day_processing[s.get()] += detail.secondary_rate();
            }
            day_blending.push(detail);
        }

        let mut day_selections = Vec::with_capacity(grades.len());
        let mut day_counts = Vec::with_capacity(grades.len());
        for g in grades.indices() {
            let mut chosen = catalogue
                .for_primary(d, g)
                .filter(|&r| sol.value(recipes.select(d, r)) >= 0.5);
            let first = chosen.next();
            day_counts.push(first.map_or(0, |_| 1 + chosen.count()));
            day_selections.push(first);
        }

        processing.push(day_processing);
        blending.push(day_blending);
        selections.push(day_selections);
        selection_counts.push(day_counts);
    }

    Extracted {
        processing,
        blending,
        selections,
        selection_counts,
    }
}

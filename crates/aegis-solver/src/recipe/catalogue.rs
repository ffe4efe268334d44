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

//! Per-day recipe catalogue.
//!
//! Each day offers the blends recorded for it (first record per primary
//! grade wins) plus a pure recipe for every grade. A recorded pure recipe
//! replaces the synthesized one for its grade.

use aegis_core::prelude::Volume;
use aegis_model::prelude::{BlendRecord, GradeIndex, GradeSet, Recipe, Schedule};
use aegis_model::recipe::RecipeOrigin;
use std::collections::BTreeSet;

pub const DEFAULT_RECIPE_CAPACITY: Volume = 95.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeCatalogue {
    days: Vec<Vec<Recipe>>,
}

impl RecipeCatalogue {
    /// Recipes for day index `day`, historical ones first in record order,
    /// then fallbacks in grade order.
    pub fn build_day(
        day: usize,
        records: &[BlendRecord],
        grades: &GradeSet,
        default_capacity: Volume,
    ) -> Vec<Recipe> {
        let mut seen_primary: BTreeSet<GradeIndex> = BTreeSet::new();
        let mut has_pure: BTreeSet<GradeIndex> = BTreeSet::new();
        let mut recipes = Vec::with_capacity(records.len() + grades.len());

        for r in records {
            if !seen_primary.insert(r.primary) {
                continue;
            }
            if r.secondary.is_none() {
                has_pure.insert(r.primary);
            }
            recipes.push(Recipe::new(
                day,
                r.primary,
                r.secondary,
                r.ratio,
                r.capacity,
                RecipeOrigin::Historical,
            ));
        }

        for g in grades.indices() {
            if has_pure.contains(&g) {
                continue;
            }
            tracing::trace!(day, grade = grades.name(g), "Adding pure fallback recipe");
            recipes.push(Recipe::pure(
                day,
                g,
                default_capacity,
                RecipeOrigin::Fallback,
            ));
        }
        recipes
    }

    /// Builds every day's recipes from the blends recorded in `schedule`.
    pub fn from_schedule(schedule: &Schedule, default_capacity: Volume) -> Self {
        let days = schedule
            .days()
            .iter()
            .enumerate()
            .map(|(d, day)| {
                let records: Vec<BlendRecord> = day
                    .blending()
                    .iter()
                    .map(|b| b.to_record(default_capacity))
                    .collect();
                Self::build_day(d, &records, schedule.grades(), default_capacity)
            })
            .collect();
        let catalogue = Self { days };
        tracing::debug!(
            days = catalogue.days.len(),
            recipes = catalogue.len(),
            "Built recipe catalogue"
        );
        catalogue
    }

    #[inline]
    pub fn day(&self, day: usize) -> &[Recipe] {
        self.days.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn days(&self) -> usize {
        self.days.len()
    }

    /// Indices (within the day) of the recipes whose primary grade is `grade`.
    pub fn for_primary(&self, day: usize, grade: GradeIndex) -> impl Iterator<Item = usize> + '_ {
        self.day(day)
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.primary() == grade)
            .map(|(i, _)| i)
    }

    /// Total number of recipes across all days.
    #[inline]
    pub fn len(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

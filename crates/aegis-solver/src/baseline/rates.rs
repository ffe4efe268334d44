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

use aegis_core::prelude::{EPSILON, Volume};
use aegis_model::prelude::{BlendDetail, GradeIndex, GradeSet, Pairing, PlantInput};
use std::cmp::Ordering;

/// A single day's rates and the recipe that produces them.
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub processing: Vec<Volume>,
    pub blending: Vec<BlendDetail>,
}

/// Grades in stock, highest margin first, ties by name.
fn ranked_in_stock(stock: &[Volume], grades: &GradeSet, plant: &PlantInput) -> Vec<GradeIndex> {
    let mut ranked: Vec<GradeIndex> = grades
        .indices()
        .filter(|g| stock[g.get()] > EPSILON)
        .collect();
    ranked.sort_by(|a, b| {
        let ma = plant.margin(grades.name(*a));
        let mb = plant.margin(grades.name(*b));
        mb.total_cmp(&ma)
            .then_with(|| grades.name(*a).cmp(grades.name(*b)))
    });
    ranked
}

struct Candidate<'a> {
    primary: GradeIndex,
    secondary: GradeIndex,
    pairing: &'a Pairing,
    weighted_margin: f64,
}

fn best_pairing<'a>(
    ranked: &[GradeIndex],
    stock: &[Volume],
    grades: &GradeSet,
    plant: &'a PlantInput,
) -> Option<Candidate<'a>> {
    let mut best: Option<Candidate<'a>> = None;
    for &primary in ranked {
        let name = grades.name(primary);
        let Some(pairing) = plant.pairing(name) else {
            continue;
        };
        let Some(secondary) = pairing.paired_with().and_then(|p| grades.index_of(p)) else {
            continue;
        };
        let ratio = pairing.ratio();
        if stock[secondary.get()] <= EPSILON
            || ratio.primary_share() <= EPSILON
            || ratio.secondary_share() <= EPSILON
        {
            continue;
        }
        let weighted_margin = plant.margin(name) * ratio.primary_share()
            + plant.margin(grades.name(secondary)) * ratio.secondary_share();
        let better = best.as_ref().is_none_or(|b| {
            weighted_margin.total_cmp(&b.weighted_margin) == Ordering::Greater
        });
        if better {
            best = Some(Candidate {
                primary,
                secondary,
                pairing,
                weighted_margin,
            });
        }
    }
    best
}

/// Greedy single-recipe plan for one day.
///
/// Runs the in-stock pairing with the highest weighted margin, limited by
/// stock, ratio, pairing capacity and plant capacity. Without such a pairing
/// the highest-margin grade in stock runs alone.
pub fn plan_day(stock: &[Volume], grades: &GradeSet, plant: &PlantInput) -> DayPlan {
    let mut processing = grades.zeros();
    let ranked = ranked_in_stock(stock, grades, plant);

    if let Some(c) = best_pairing(&ranked, stock, grades, plant) {
        let ratio = c.pairing.ratio();
        let (r0, r1) = (ratio.primary_share(), ratio.secondary_share());
        let cap = c.pairing.capacity().min(plant.capacity());

        let max_p = stock[c.primary.get()].min(cap * r0);
        let max_s = stock[c.secondary.get()].min(cap * r1);
        let (mut p, mut s) = if max_p / r0 < max_s / r1 {
            (max_p, max_p * r1 / r0)
        } else {
            (max_s * r0 / r1, max_s)
        };
        let total = p + s;
        if total > cap {
            let scale = cap / total;
            p *= scale;
            s *= scale;
        }

        if p + s > EPSILON {
            processing[c.primary.get()] = p;
            processing[c.secondary.get()] = s;
            return DayPlan {
                processing,
                blending: vec![BlendDetail::blend(
                    c.primary,
                    c.secondary,
                    p,
                    s,
                    ratio,
                    Some(c.pairing.capacity()),
                )],
            };
        }
    }

    let Some(&grade) = ranked.first() else {
        return DayPlan {
            processing,
            blending: Vec::new(),
        };
    };
    let solo_cap = plant.solo_capacity(grades.name(grade));
    let rate = stock[grade.get()].min(solo_cap.min(plant.capacity()));
    if rate <= EPSILON {
        return DayPlan {
            processing,
            blending: Vec::new(),
        };
    }
    processing[grade.get()] = rate;
    DayPlan {
        processing,
        blending: vec![BlendDetail::solo(grade, rate, Some(solo_cap))],
    }
}

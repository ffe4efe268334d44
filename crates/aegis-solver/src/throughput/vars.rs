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

//! Typed variable tables for the throughput model.

use aegis_model::prelude::GradeIndex;
use good_lp::Variable;
use std::ops::Index;

/// A dense table keyed by (day index, grade).
#[derive(Debug, Clone, PartialEq)]
pub struct DayGradeTable<T> {
    grades: usize,
    cells: Vec<T>,
}

impl<T> DayGradeTable<T> {
    pub fn from_fn<F>(days: usize, grades: usize, mut f: F) -> Self
    where
        F: FnMut(usize, GradeIndex) -> T,
    {
        let mut cells = Vec::with_capacity(days * grades);
        for d in 0..days {
            for g in 0..grades {
                cells.push(f(d, GradeIndex::new(g)));
            }
        }
        Self { grades, cells }
    }

    #[inline]
    pub fn days(&self) -> usize {
        if self.grades == 0 {
            0
        } else {
            self.cells.len() / self.grades
        }
    }

    #[inline]
    pub fn grades(&self) -> usize {
        self.grades
    }

    #[inline]
    pub fn get(&self, day: usize, grade: GradeIndex) -> Option<&T> {
        if grade.get() >= self.grades {
            return None;
        }
        self.cells.get(day * self.grades + grade.get())
    }

    #[inline]
    pub fn row(&self, day: usize) -> &[T] {
        &self.cells[day * self.grades..(day + 1) * self.grades]
    }
}

impl<T> Index<(usize, GradeIndex)> for DayGradeTable<T> {
    type Output = T;

    #[inline]
    fn index(&self, (day, grade): (usize, GradeIndex)) -> &T {
        debug_assert!(grade.get() < self.grades);
        &self.cells[day * self.grades + grade.get()]
    }
}

/// Selection and rate variables of each day's recipes, in catalogue order.
#[derive(Debug, Clone, Default)]
pub struct RecipeVars {
    select: Vec<Vec<Variable>>,
    rate: Vec<Vec<Variable>>,
}

impl RecipeVars {
    #[inline]
    pub fn push_day(&mut self, select: Vec<Variable>, rate: Vec<Variable>) {
        debug_assert_eq!(select.len(), rate.len());
        self.select.push(select);
        self.rate.push(rate);
    }

    #[inline]
    pub fn select(&self, day: usize, recipe: usize) -> Variable {
        self.select[day][recipe]
    }

    #[inline]
    pub fn rate(&self, day: usize, recipe: usize) -> Variable {
        self.rate[day][recipe]
    }

    #[inline]
    pub fn rates(&self, day: usize) -> &[Variable] {
        &self.rate[day]
    }

    #[inline]
    pub fn selects(&self, day: usize) -> &[Variable] {
        &self.select[day]
    }

    #[inline]
    pub fn days(&self) -> usize {
        self.rate.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_row_major_by_day() {
        let t = DayGradeTable::from_fn(3, 2, |d, g| d * 10 + g.get());
        assert_eq!(t.days(), 3);
        assert_eq!(t[(2, GradeIndex::new(1))], 21);
        assert_eq!(t.row(1), &[10, 11]);
        assert_eq!(t.get(0, GradeIndex::new(2)), None);
        assert_eq!(t.get(5, GradeIndex::new(0)), None);
    }

    #[test]
    fn test_empty_grade_set_has_no_days() {
        let t: DayGradeTable<u8> = DayGradeTable::from_fn(4, 0, |_, _| 0);
        assert_eq!(t.days(), 0);
    }
}

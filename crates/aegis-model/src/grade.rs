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

//! Grade interning.
//!
//! Input documents key everything by grade name. Solvers work on dense
//! indices instead so that per-day tables can be plain vectors.

use crate::err::UnknownGradeError;
use std::collections::BTreeSet;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GradeIndex(usize);

impl GradeIndex {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for GradeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GradeIndex({})", self.0)
    }
}

/// Sorted, de-duplicated grade names. Index order equals name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeSet {
    names: Vec<String>,
}

impl GradeSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self {
            names: set.into_iter().collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<GradeIndex> {
        self.names
            .binary_search_by(|n| n.as_str().cmp(name))
            .ok()
            .map(GradeIndex::new)
    }

    #[inline]
    pub fn require(&self, name: &str) -> Result<GradeIndex, UnknownGradeError> {
        self.index_of(name)
            .ok_or_else(|| UnknownGradeError::new(name))
    }

    /// Panics if `index` was not produced by this set.
    #[inline]
    pub fn name(&self, index: GradeIndex) -> &str {
        &self.names[index.get()]
    }

    #[inline]
    pub fn indices(&self) -> impl Iterator<Item = GradeIndex> + '_ {
        (0..self.names.len()).map(GradeIndex::new)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (GradeIndex, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (GradeIndex::new(i), n.as_str()))
    }

    /// A zeroed per-grade vector.
    #[inline]
    pub fn zeros(&self) -> Vec<f64> {
        vec![0.0; self.names.len()]
    }
}

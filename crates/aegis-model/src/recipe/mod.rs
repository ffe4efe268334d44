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

//! Blend recipes.
//!
//! A recipe processes one primary grade, optionally blended with a secondary
//! grade at a fixed ratio, up to a daily capacity ceiling.

use crate::{err::RatioParseError, grade::GradeIndex};
use aegis_core::prelude::Volume;
use std::str::FromStr;

/// Shares of the primary and secondary grade in a blend. Always sums to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratio {
    primary: f64,
    secondary: f64,
}

impl Ratio {
    #[inline]
    pub const fn pure() -> Self {
        Self {
            primary: 1.0,
            secondary: 0.0,
        }
    }

    /// Builds a ratio from two non-negative parts, normalized by their sum.
    pub fn from_parts(primary: f64, secondary: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(primary) || !valid(secondary) {
            return None;
        }
        let sum = primary + secondary;
        if sum <= 0.0 {
            return None;
        }
        Some(Self {
            primary: primary / sum,
            secondary: secondary / sum,
        })
    }

    /// Parses `"P:S"`. Shares (`"0.60:0.40"`) and percentages (`"27:73"`)
    /// are both accepted since the parts are normalized.
    pub fn parse(text: &str) -> Result<Self, RatioParseError> {
        let err = || RatioParseError::new(text);
        let (p, s) = text.split_once(':').ok_or_else(err)?;
        let p: f64 = p.trim().parse().map_err(|_| err())?;
        let s: f64 = s.trim().parse().map_err(|_| err())?;
        Self::from_parts(p, s).ok_or_else(err)
    }

    #[inline]
    pub fn primary_share(&self) -> f64 {
        self.primary
    }

    #[inline]
    pub fn secondary_share(&self) -> f64 {
        self.secondary
    }

    #[inline]
    pub fn is_pure(&self) -> bool {
        self.secondary == 0.0
    }

    /// Two-decimal text form, e.g. `"0.60:0.40"`.
    #[inline]
    pub fn to_text(&self) -> String {
        format!("{:.2}:{:.2}", self.primary, self.secondary)
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::pure()
    }
}

impl FromStr for Ratio {
    type Err = RatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// A blend observed in a schedule, used as catalogue input.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendRecord {
    pub primary: GradeIndex,
    pub secondary: Option<GradeIndex>,
    pub ratio: Ratio,
    pub capacity: Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeOrigin {
    /// Taken from the blending history of the day.
    Historical,
    /// Synthesized pure-grade recipe at the default ceiling.
    Fallback,
}

impl std::fmt::Display for RecipeOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeOrigin::Historical => write!(f, "historical"),
            RecipeOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    day: usize,
    primary: GradeIndex,
    secondary: Option<GradeIndex>,
    ratio: Ratio,
    capacity: Volume,
    origin: RecipeOrigin,
}

impl Recipe {
    #[inline]
    pub fn new(
        day: usize,
        primary: GradeIndex,
        secondary: Option<GradeIndex>,
        ratio: Ratio,
        capacity: Volume,
        origin: RecipeOrigin,
    ) -> Self {
        // A recipe without a secondary grade always runs pure.
        let ratio = if secondary.is_some() { ratio } else { Ratio::pure() };
        Self {
            day,
            primary,
            secondary,
            ratio,
            capacity,
            origin,
        }
    }

    #[inline]
    pub fn pure(day: usize, grade: GradeIndex, capacity: Volume, origin: RecipeOrigin) -> Self {
        Self::new(day, grade, None, Ratio::pure(), capacity, origin)
    }

    /// Index of the day in the schedule, not the calendar day.
    #[inline]
    pub fn day(&self) -> usize {
        self.day
    }

    #[inline]
    pub fn primary(&self) -> GradeIndex {
        self.primary
    }

    #[inline]
    pub fn secondary(&self) -> Option<GradeIndex> {
        self.secondary
    }

    #[inline]
    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    #[inline]
    pub fn capacity(&self) -> Volume {
        self.capacity
    }

    #[inline]
    pub fn origin(&self) -> RecipeOrigin {
        self.origin
    }

    #[inline]
    pub fn is_pure(&self) -> bool {
        self.secondary.is_none()
    }

    /// Fraction of this recipe's rate that consumes `grade`.
    #[inline]
    pub fn share_of(&self, grade: GradeIndex) -> f64 {
        if grade == self.primary {
            self.ratio.primary_share()
        } else if Some(grade) == self.secondary {
            self.ratio.secondary_share()
        } else {
            0.0
        }
    }

    #[inline]
    pub fn uses(&self, grade: GradeIndex) -> bool {
        grade == self.primary || Some(grade) == self.secondary
    }
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.secondary {
            Some(s) => write!(
                f,
                "Recipe(day {}, {} + {} @ {}, cap {})",
                self.day, self.primary, s, self.ratio, self.capacity
            ),
            None => write!(
                f,
                "Recipe(day {}, {} pure, cap {})",
                self.day, self.primary, self.capacity
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::prelude::approx_eq;

    #[test]
    fn test_ratio_parses_shares_and_percentages() {
        let r = Ratio::parse("0.60:0.40").unwrap();
        assert!(approx_eq(r.primary_share(), 0.6));
        assert!(approx_eq(r.secondary_share(), 0.4));

        let r: Ratio = "27:73".parse().unwrap();
        assert!(approx_eq(r.primary_share(), 0.27));
        assert_eq!(r.to_text(), "0.27:0.73");
    }

    #[test]
    fn test_ratio_rejects_garbage() {
        for bad in ["", "0.6", "a:b", "0:0", "-1:2", "1:2:3"] {
            assert!(Ratio::parse(bad).is_err(), "accepted '{bad}'");
        }
    }

    #[test]
    fn test_pure_ratio_text() {
        assert_eq!(Ratio::pure().to_text(), "1.00:0.00");
        assert!(Ratio::pure().is_pure());
    }

    #[test]
    fn test_share_of_grades() {
        let a = GradeIndex::new(0);
        let b = GradeIndex::new(1);
        let c = GradeIndex::new(2);
        let r = Recipe::new(
            0,
            a,
            Some(b),
            Ratio::parse("0.75:0.25").unwrap(),
            90.0,
            RecipeOrigin::Historical,
        );
        assert!(approx_eq(r.share_of(a), 0.75));
        assert!(approx_eq(r.share_of(b), 0.25));
        assert_eq!(r.share_of(c), 0.0);
        assert!(r.uses(b) && !r.uses(c));
    }

    #[test]
    fn test_recipe_without_secondary_is_forced_pure() {
        let r = Recipe::new(
            3,
            GradeIndex::new(0),
            None,
            Ratio::parse("0.5:0.5").unwrap(),
            95.0,
            RecipeOrigin::Fallback,
        );
        assert!(r.is_pure());
        assert_eq!(r.share_of(GradeIndex::new(0)), 1.0);
    }
}

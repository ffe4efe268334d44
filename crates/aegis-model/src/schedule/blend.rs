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

use crate::{
    err::{InputError, non_negative},
    grade::{GradeIndex, GradeSet},
    recipe::{BlendRecord, Ratio},
    schedule::doc::BlendDetailDocument,
};
use aegis_core::prelude::{EPSILON, Volume};

/// One recipe run on one day: the rates actually processed for its grades.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendDetail {
    primary: GradeIndex,
    secondary: Option<GradeIndex>,
    primary_rate: Volume,
    secondary_rate: Volume,
    ratio: Ratio,
    capacity_limit: Option<Volume>,
}

impl BlendDetail {
    #[inline]
    pub fn solo(grade: GradeIndex, rate: Volume, capacity_limit: Option<Volume>) -> Self {
        Self {
            primary: grade,
            secondary: None,
            primary_rate: rate,
            secondary_rate: 0.0,
            ratio: Ratio::pure(),
            capacity_limit,
        }
    }

    #[inline]
    pub fn blend(
        primary: GradeIndex,
        secondary: GradeIndex,
        primary_rate: Volume,
        secondary_rate: Volume,
        ratio: Ratio,
        capacity_limit: Option<Volume>,
    ) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
            primary_rate,
            secondary_rate,
            ratio,
            capacity_limit,
        }
    }

    /// Splits `total_rate` between the recipe's grades by its ratio.
    #[inline]
    pub fn from_total(
        primary: GradeIndex,
        secondary: Option<GradeIndex>,
        ratio: Ratio,
        total_rate: Volume,
        capacity_limit: Option<Volume>,
    ) -> Self {
        match secondary {
            Some(s) => Self::blend(
                primary,
                s,
                ratio.primary_share() * total_rate,
                ratio.secondary_share() * total_rate,
                ratio,
                capacity_limit,
            ),
            None => Self::solo(primary, total_rate, capacity_limit),
        }
    }

    pub fn from_document(doc: &BlendDetailDocument, grades: &GradeSet) -> Result<Self, InputError> {
        let primary = grades.require(&doc.primary_grade)?;
        let secondary = match doc.secondary_grade.as_deref().map(str::trim) {
            None | Some("") | Some("-") => None,
            Some(name) if name == doc.primary_grade => {
                return Err(InputError::SelfBlend(name.to_string()));
            }
            Some(name) => Some(grades.require(name)?),
        };
        let primary_rate = non_negative("primary_rate", doc.primary_rate)?;
        let secondary_rate = non_negative("secondary_rate", doc.secondary_rate)?;
        let capacity_limit = doc
            .capacity_limit
            .map(|c| non_negative("capacity_limit", c))
            .transpose()?;

        let Some(secondary) = secondary else {
            return Ok(Self::solo(primary, primary_rate, capacity_limit));
        };

        // Running rates are exact; the ratio text is rounded to two decimals.
        let ratio = match (
            primary_rate > EPSILON && secondary_rate > EPSILON,
            doc.ratio.as_deref(),
        ) {
            (true, _) | (false, None) => Ratio::from_parts(primary_rate, secondary_rate)
                .ok_or(InputError::MissingField("ratio"))?,
            (false, Some(text)) => Ratio::parse(text)?,
        };
        Ok(Self::blend(
            primary,
            secondary,
            primary_rate,
            secondary_rate,
            ratio,
            capacity_limit,
        ))
    }

    pub fn to_document(&self, grades: &GradeSet) -> BlendDetailDocument {
        let total = self.total_rate();
        BlendDetailDocument {
            primary_grade: grades.name(self.primary).to_string(),
            secondary_grade: self.secondary.map(|s| grades.name(s).to_string()),
            primary_rate: self.primary_rate,
            secondary_rate: self.secondary_rate,
            total_rate: total,
            ratio: Some(self.ratio.to_text()),
            capacity_used: total,
            capacity_limit: self.capacity_limit,
            extra: Default::default(),
        }
    }

    #[inline]
    pub fn to_record(&self, default_capacity: Volume) -> BlendRecord {
        BlendRecord {
            primary: self.primary,
            secondary: self.secondary,
            ratio: self.ratio,
            capacity: self.capacity_limit.unwrap_or(default_capacity),
        }
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
    pub fn primary_rate(&self) -> Volume {
        self.primary_rate
    }

    #[inline]
    pub fn secondary_rate(&self) -> Volume {
        self.secondary_rate
    }

    #[inline]
    pub fn total_rate(&self) -> Volume {
        self.primary_rate + self.secondary_rate
    }

    #[inline]
    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    #[inline]
    pub fn capacity_limit(&self) -> Option<Volume> {
        self.capacity_limit
    }

    #[inline]
    pub fn uses(&self, grade: GradeIndex) -> bool {
        self.primary == grade || self.secondary == Some(grade)
    }

    /// Rate of `grade` in this blend.
    #[inline]
    pub fn rate_of(&self, grade: GradeIndex) -> Volume {
        if self.primary == grade {
            self.primary_rate
        } else if self.secondary == Some(grade) {
            self.secondary_rate
        } else {
            0.0
        }
    }

    /// Adds `delta` to the rate of `grade`, clamping at zero. The ratio of a
    /// blend follows its new rates. Returns `false` if the blend does not use
    /// the grade.
    pub fn add_rate(&mut self, grade: GradeIndex, delta: Volume) -> bool {
        if self.primary == grade {
            self.primary_rate = (self.primary_rate + delta).max(0.0);
        } else if self.secondary == Some(grade) {
            self.secondary_rate = (self.secondary_rate + delta).max(0.0);
        } else {
            return false;
        }
        if self.secondary.is_some() {
            if let Some(r) = Ratio::from_parts(self.primary_rate, self.secondary_rate) {
                self.ratio = r;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::prelude::approx_eq;

    fn grades() -> GradeSet {
        GradeSet::from_names(["A", "B"])
    }

    fn doc(primary: &str, secondary: Option<&str>) -> BlendDetailDocument {
        BlendDetailDocument {
            primary_grade: primary.to_string(),
            secondary_grade: secondary.map(str::to_string),
            primary_rate: 60.0,
            secondary_rate: 20.0,
            total_rate: 80.0,
            ratio: Some("0.75:0.25".to_string()),
            capacity_used: 80.0,
            capacity_limit: Some(90.0),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_from_document_blend() {
        let g = grades();
        let b = BlendDetail::from_document(&doc("A", Some("B")), &g).unwrap();
        assert_eq!(b.secondary(), g.index_of("B"));
        assert!(approx_eq(b.total_rate(), 80.0));
        assert!(approx_eq(b.ratio().primary_share(), 0.75));
        assert_eq!(b.capacity_limit(), Some(90.0));
    }

    #[test]
    fn test_empty_secondary_means_solo() {
        let g = grades();
        for s in [None, Some(""), Some("-")] {
            let b = BlendDetail::from_document(&doc("A", s), &g).unwrap();
            assert!(b.secondary().is_none());
            assert!(b.ratio().is_pure());
        }
    }

    #[test]
    fn test_self_blend_and_unknown_grade_fail() {
        let g = grades();
        assert!(matches!(
            BlendDetail::from_document(&doc("A", Some("A")), &g),
            Err(InputError::SelfBlend(_))
        ));
        assert!(matches!(
            BlendDetail::from_document(&doc("A", Some("Z")), &g),
            Err(InputError::UnknownGrade(_))
        ));
    }

    #[test]
    fn test_missing_ratio_is_derived_from_rates() {
        let g = grades();
        let mut d = doc("A", Some("B"));
        d.ratio = None;
        let b = BlendDetail::from_document(&d, &g).unwrap();
        assert_eq!(b.ratio().to_text(), "0.75:0.25");
    }

    #[test]
    fn test_running_rates_take_precedence_over_rounded_ratio() {
        let g = grades();
        let b = BlendDetail::from_total(
            GradeIndex::new(0),
            Some(GradeIndex::new(1)),
            Ratio::parse("1:2").unwrap(),
            90.0,
            Some(95.0),
        );
        let d = b.to_document(&g);
        assert_eq!(d.ratio.as_deref(), Some("0.33:0.67"));

        let back = BlendDetail::from_document(&d, &g).unwrap();
        assert!(approx_eq(back.ratio().primary_share(), 1.0 / 3.0));
        let rerun = BlendDetail::from_total(
            back.primary(),
            back.secondary(),
            back.ratio(),
            90.0,
            back.capacity_limit(),
        );
        assert!(approx_eq(rerun.primary_rate(), 30.0));
        assert!(approx_eq(rerun.secondary_rate(), 60.0));
    }

    #[test]
    fn test_idle_blend_keeps_recorded_ratio() {
        let g = grades();
        let mut d = doc("A", Some("B"));
        d.primary_rate = 0.0;
        d.secondary_rate = 0.0;
        d.ratio = Some("1:2".to_string());
        let b = BlendDetail::from_document(&d, &g).unwrap();
        assert!(approx_eq(b.ratio().primary_share(), 1.0 / 3.0));

        d.ratio = None;
        assert_eq!(
            BlendDetail::from_document(&d, &g),
            Err(InputError::MissingField("ratio"))
        );
    }

    #[test]
    fn test_add_rate_rebalances_ratio() {
        let mut b = BlendDetail::from_total(
            GradeIndex::new(0),
            Some(GradeIndex::new(1)),
            Ratio::parse("0.5:0.5").unwrap(),
            40.0,
            None,
        );
        assert!(b.add_rate(GradeIndex::new(0), 20.0));
        assert_eq!(b.ratio().to_text(), "0.67:0.33");
        assert!(!b.add_rate(GradeIndex::new(2), 1.0));
        b.add_rate(GradeIndex::new(1), -100.0);
        assert_eq!(b.secondary_rate(), 0.0);
    }

    #[test]
    fn test_to_document_fills_totals() {
        let g = grades();
        let b = BlendDetail::from_total(
            GradeIndex::new(0),
            Some(GradeIndex::new(1)),
            Ratio::parse("0.6:0.4").unwrap(),
            50.0,
            Some(95.0),
        );
        let d = b.to_document(&g);
        assert!(approx_eq(d.primary_rate, 30.0));
        assert!(approx_eq(d.secondary_rate, 20.0));
        assert!(approx_eq(d.capacity_used, 50.0));
        assert_eq!(d.ratio.as_deref(), Some("0.60:0.40"));
        assert_eq!(d.secondary_grade.as_deref(), Some("B"));
    }
}

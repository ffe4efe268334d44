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

use crate::err::LdrParseError;
use aegis_core::prelude::DayPoint;
use std::str::FromStr;

/// A loading date range (LDR) at origin, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadingWindow {
    start: DayPoint,
    end: DayPoint,
    month: Option<String>,
}

/// Window days are days of a month.
const MAX_DAY_OF_MONTH: i64 = 31;

impl LoadingWindow {
    #[inline]
    pub fn new(start: DayPoint, end: DayPoint, month: Option<String>) -> Result<Self, LdrParseError> {
        if end < start {
            return Err(LdrParseError::new(format!(
                "{}-{}",
                start.value(),
                end.value()
            )));
        }
        Ok(Self { start, end, month })
    }

    /// Parses `"1-3 Oct"`, `"5 Oct"` or `"1-3"`.
    pub fn parse(text: &str) -> Result<Self, LdrParseError> {
        let err = || LdrParseError::new(text);
        let mut parts = text.split_whitespace();
        let range = parts.next().ok_or_else(err)?;
        let month = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return Err(err());
        }

        let (a, b) = match range.split_once('-') {
            Some((a, b)) => (a, b),
            None => (range, range),
        };
        let start: i64 = a.trim().parse().map_err(|_| err())?;
        let end: i64 = b.trim().parse().map_err(|_| err())?;
        if start < 1 || end < start || end > MAX_DAY_OF_MONTH {
            return Err(err());
        }

        Ok(Self {
            start: DayPoint::new(start),
            end: DayPoint::new(end),
            month,
        })
    }

    #[inline]
    pub fn start(&self) -> DayPoint {
        self.start
    }

    #[inline]
    pub fn end(&self) -> DayPoint {
        self.end
    }

    #[inline]
    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    /// Common sub-window of all `windows`, or `None` when they do not overlap.
    pub fn intersection<'a, I>(windows: I) -> Option<(DayPoint, DayPoint)>
    where
        I: IntoIterator<Item = &'a LoadingWindow>,
    {
        let mut it = windows.into_iter();
        let first = it.next()?;
        let (mut lo, mut hi) = (first.start, first.end);
        for w in it {
            lo = lo.max(w.start);
            hi = hi.min(w.end);
        }
        (lo <= hi).then_some((lo, hi))
    }

    /// Renders a window in LDR notation, e.g. `"2-3 Oct"`.
    pub fn format_range(start: DayPoint, end: DayPoint, month: Option<&str>) -> String {
        match month {
            Some(m) => format!("{}-{} {}", start.value(), end.value(), m),
            None => format!("{}-{}", start.value(), end.value()),
        }
    }
}

impl FromStr for LoadingWindow {
    type Err = LdrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for LoadingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            Self::format_range(self.start, self.end, self.month())
        )
    }
}

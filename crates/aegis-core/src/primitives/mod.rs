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

pub mod affine;

pub use affine::*;

/// Volumes are measured in thousands of barrels (kb), rates in kb per day.
pub type Volume = f64;

/// Monetary amounts in USD.
pub type Cost = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayMarker;

impl MarkerName for DayMarker {
    const NAME_POINT: &'static str = "Day";
    const NAME_DELTA: &'static str = "Days";
}

/// A calendar day of the planning month (1-based in all input documents).
pub type DayPoint = Point<i64, DayMarker>;

/// A whole number of days.
pub type DayDelta = Delta<i64, DayMarker>;

impl Delta<i64, DayMarker> {
    /// Rounds a possibly fractional duration up to whole days.
    ///
    /// Negative and non-finite durations collapse to zero days.
    #[inline]
    pub fn ceil_days(days: f64) -> Self {
        if !days.is_finite() || days <= 0.0 {
            return Delta::new(0);
        }
        Delta::new(days.ceil() as i64)
    }
}

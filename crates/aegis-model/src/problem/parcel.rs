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
    common::{Identifier, IdentifierMarkerName},
    grade::GradeIndex,
    problem::ldr::LoadingWindow,
};
use aegis_core::prelude::{DayDelta, DayPoint, Volume};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParcelIdentifierMarker;

impl IdentifierMarkerName for ParcelIdentifierMarker {
    const NAME: &'static str = "ParcelId";
}

pub type ParcelIdentifier = Identifier<u32, ParcelIdentifierMarker>;

/// One grade's delivery volume with its loading window and origin.
///
/// The travel time is already ceiling-rounded to whole days, so both arrival
/// bounds are plain day arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    id: ParcelIdentifier,
    grade: GradeIndex,
    volume: Volume,
    origin: String,
    window: LoadingWindow,
    travel_time: DayDelta,
}

impl Parcel {
    #[inline]
    pub fn new(
        id: ParcelIdentifier,
        grade: GradeIndex,
        volume: Volume,
        origin: impl Into<String>,
        window: LoadingWindow,
        travel_time: DayDelta,
    ) -> Self {
        Self {
            id,
            grade,
            volume,
            origin: origin.into(),
            window,
            travel_time,
        }
    }

    #[inline]
    pub fn id(&self) -> ParcelIdentifier {
        self.id
    }

    #[inline]
    pub fn grade(&self) -> GradeIndex {
        self.grade
    }

    #[inline]
    pub fn volume(&self) -> Volume {
        self.volume
    }

    #[inline]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[inline]
    pub fn window(&self) -> &LoadingWindow {
        &self.window
    }

    #[inline]
    pub fn travel_time(&self) -> DayDelta {
        self.travel_time
    }

    #[inline]
    pub fn earliest_arrival(&self) -> DayPoint {
        self.window.start() + self.travel_time
    }

    #[inline]
    pub fn latest_arrival(&self) -> DayPoint {
        self.window.end() + self.travel_time
    }
}

impl std::fmt::Display for Parcel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parcel({}, {}, {} kb, {}, {})",
            self.id, self.grade, self.volume, self.origin, self.window
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrival_bounds_shift_window_by_travel_time() {
        let p = Parcel::new(
            ParcelIdentifier::new(1),
            GradeIndex::new(0),
            400.0,
            "Sabah",
            LoadingWindow::parse("1-3 Oct").unwrap(),
            DayDelta::new(2),
        );
        assert_eq!(p.earliest_arrival(), DayPoint::new(3));
        assert_eq!(p.latest_arrival(), DayPoint::new(5));
        assert_eq!(p.origin(), "Sabah");
    }

    #[test]
    fn test_zero_travel_time_keeps_window() {
        let p = Parcel::new(
            ParcelIdentifier::new(7),
            GradeIndex::new(2),
            150.0,
            "Melaka",
            LoadingWindow::parse("4 Oct").unwrap(),
            DayDelta::new(0),
        );
        assert_eq!(p.earliest_arrival(), p.latest_arrival());
        assert_eq!(p.id().into_inner(), 7);
    }
}

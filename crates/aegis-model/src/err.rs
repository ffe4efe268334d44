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

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LdrParseError {
    text: String,
}

impl LdrParseError {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for LdrParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid loading date range '{}' (expected e.g. '1-3 Oct')",
            self.text
        )
    }
}

impl std::error::Error for LdrParseError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RatioParseError {
    text: String,
}

impl RatioParseError {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for RatioParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid blend ratio '{}' (expected 'P:S', e.g. '27:73' or '0.60:0.40')",
            self.text
        )
    }
}

impl std::error::Error for RatioParseError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownGradeError {
    grade: String,
}

impl UnknownGradeError {
    pub fn new(grade: impl Into<String>) -> Self {
        Self {
            grade: grade.into(),
        }
    }

    pub fn grade(&self) -> &str {
        &self.grade
    }
}

impl std::fmt::Display for UnknownGradeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown crude grade '{}'", self.grade)
    }
}

impl std::error::Error for UnknownGradeError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayKeyError {
    key: String,
}

impl DayKeyError {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for DayKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Daily plan key '{}' is not a day number", self.key)
    }
}

impl std::error::Error for DayKeyError {}

#[derive(Debug, Clone, PartialEq)]
pub struct InvalidValueError {
    field: &'static str,
    value: f64,
    reason: &'static str,
}

impl InvalidValueError {
    pub fn new(field: &'static str, value: f64, reason: &'static str) -> Self {
        Self {
            field,
            value,
            reason,
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl std::fmt::Display for InvalidValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid value {} for '{}': {}",
            self.value, self.field, self.reason
        )
    }
}

impl std::error::Error for InvalidValueError {}

/// Malformed or missing data in an input document. Always raised before any
/// solver work starts.
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    Ldr(LdrParseError),
    Ratio(RatioParseError),
    UnknownGrade(UnknownGradeError),
    DayKey(DayKeyError),
    InvalidValue(InvalidValueError),
    MissingField(&'static str),
    SelfBlend(String),
    EmptySchedule,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Ldr(e) => write!(f, "{}", e),
            InputError::Ratio(e) => write!(f, "{}", e),
            InputError::UnknownGrade(e) => write!(f, "{}", e),
            InputError::DayKey(e) => write!(f, "{}", e),
            InputError::InvalidValue(e) => write!(f, "{}", e),
            InputError::MissingField(name) => write!(f, "Missing required field '{}'", name),
            InputError::SelfBlend(grade) => {
                write!(f, "Blend of grade '{}' with itself is not a recipe", grade)
            }
            InputError::EmptySchedule => write!(f, "Schedule has no daily plan"),
        }
    }
}

impl std::error::Error for InputError {}

impl From<LdrParseError> for InputError {
    fn from(err: LdrParseError) -> Self {
        InputError::Ldr(err)
    }
}

impl From<RatioParseError> for InputError {
    fn from(err: RatioParseError) -> Self {
        InputError::Ratio(err)
    }
}

impl From<UnknownGradeError> for InputError {
    fn from(err: UnknownGradeError) -> Self {
        InputError::UnknownGrade(err)
    }
}

impl From<DayKeyError> for InputError {
    fn from(err: DayKeyError) -> Self {
        InputError::DayKey(err)
    }
}

impl From<InvalidValueError> for InputError {
    fn from(err: InvalidValueError) -> Self {
        InputError::InvalidValue(err)
    }
}

#[derive(Debug)]
pub enum LoaderError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Input(InputError),
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderError::Io(e) => write!(f, "I/O error: {}", e),
            LoaderError::Json(e) => write!(f, "JSON error: {}", e),
            LoaderError::Input(e) => write!(f, "Input error: {}", e),
        }
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoaderError::Io(e) => Some(e),
            LoaderError::Json(e) => Some(e),
            LoaderError::Input(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err)
    }
}

impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        LoaderError::Json(err)
    }
}

impl From<InputError> for LoaderError {
    fn from(err: InputError) -> Self {
        LoaderError::Input(err)
    }
}

/// Returns `Ok(value)` when `value` is finite and not negative.
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, InvalidValueError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(InvalidValueError::new(
            field,
            value,
            "must be a finite, non-negative number",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_messages() {
        let e: InputError = LdrParseError::new("x-y").into();
        assert!(e.to_string().contains("x-y"));
        let e: InputError = UnknownGradeError::new("Z").into();
        assert_eq!(e.to_string(), "Unknown crude grade 'Z'");
        assert_eq!(
            InputError::MissingField("freight_cost_usd").to_string(),
            "Missing required field 'freight_cost_usd'"
        );
    }

    #[test]
    fn test_non_negative_rejects_negative_and_nan() {
        assert_eq!(non_negative("volume_kb", 3.0), Ok(3.0));
        assert!(non_negative("volume_kb", -1.0).is_err());
        assert!(non_negative("volume_kb", f64::NAN).is_err());
    }

    #[test]
    fn test_loader_error_wraps_input_error_as_source() {
        use std::error::Error;
        let e = LoaderError::from(InputError::EmptySchedule);
        assert!(e.source().is_some());
        assert!(e.to_string().starts_with("Input error"));
    }
}

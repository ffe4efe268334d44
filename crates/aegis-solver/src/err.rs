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

use aegis_model::err::{InputError, LoaderError};

/// Why a MILP produced no usable solution.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveFailure {
    /// The solver proved the model infeasible.
    Infeasible,
    /// The time limit ran out before optimality was proven.
    Timeout,
    Unbounded,
    /// Any other solver error.
    Solver(String),
    /// The selected vessel groups do not cover every parcel exactly once.
    CoverMismatch { uncovered: usize, duplicated: usize },
}

impl std::fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveFailure::Infeasible => write!(f, "Problem is infeasible"),
            SolveFailure::Timeout => write!(f, "Time limit reached without a proven optimum"),
            SolveFailure::Unbounded => write!(f, "Problem is unbounded"),
            SolveFailure::Solver(msg) => write!(f, "Solver error: {}", msg),
            SolveFailure::CoverMismatch {
                uncovered,
                duplicated,
            } => write!(
                f,
                "Selected vessels leave {} parcels uncovered and {} covered twice",
                uncovered, duplicated
            ),
        }
    }
}

impl std::error::Error for SolveFailure {}

#[derive(Debug)]
pub enum PipelineError {
    Load(LoaderError),
    Input(InputError),
    /// The vessel allocation failed, so there is nothing to schedule.
    Vessels(SolveFailure),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Load(e) => write!(f, "{}", e),
            PipelineError::Input(e) => write!(f, "Invalid input: {}", e),
            PipelineError::Vessels(e) => write!(f, "Vessel allocation failed: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Load(e) => Some(e),
            PipelineError::Input(e) => Some(e),
            PipelineError::Vessels(e) => Some(e),
        }
    }
}

impl From<LoaderError> for PipelineError {
    fn from(err: LoaderError) -> Self {
        PipelineError::Load(err)
    }
}

impl From<InputError> for PipelineError {
    fn from(err: InputError) -> Self {
        PipelineError::Input(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(SolveFailure::Infeasible.to_string(), "Problem is infeasible");
        let e = SolveFailure::CoverMismatch {
            uncovered: 1,
            duplicated: 0,
        };
        assert!(e.to_string().contains("1 parcels uncovered"));
        let p = PipelineError::Vessels(SolveFailure::Timeout);
        assert!(p.to_string().starts_with("Vessel allocation failed"));
    }
}

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

//! One MILP solve with a wall-clock limit.
//!
//! A session is created per optimization call and owns nothing global, so
//! vessel and throughput solves can run side by side.

use crate::err::SolveFailure;
use good_lp::solvers::highs::{HighsProblem, HighsSolution, highs};
use good_lp::*;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SolverSession {
    label: &'static str,
    time_limit: Duration,
    started: Instant,
}

impl SolverSession {
    #[inline]
    pub fn new(label: &'static str, time_limit_secs: u64) -> Self {
        Self {
            label,
            time_limit: Duration::from_secs(time_limit_secs),
            started: Instant::now(),
        }
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[inline]
    pub fn minimise(&self, vars: ProblemVariables, objective: Expression) -> HighsProblem {
        vars.minimise(objective)
            .using(highs)
            .with_time_limit(self.time_limit.as_secs_f64())
    }

    #[inline]
    pub fn maximise(&self, vars: ProblemVariables, objective: Expression) -> HighsProblem {
        vars.maximise(objective)
            .using(highs)
            .with_time_limit(self.time_limit.as_secs_f64())
    }

    /// Solves `problem`; anything short of a proven optimum is a failure.
    #[tracing::instrument(level = "debug", skip_all, fields(label = self.label))]
    pub fn solve(&self, problem: HighsProblem) -> Result<HighsSolution, SolveFailure> {
        let result = problem.solve();
        let elapsed = self.elapsed();
        match result {
            Ok(sol) => match sol.status() {
                SolutionStatus::Optimal => {
                    tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "Solved to optimality");
                    Ok(sol)
                }
                status => {
                    tracing::warn!(
                        ?status,
                        limit_secs = self.time_limit.as_secs(),
                        "Solver stopped without proving optimality"
                    );
                    Err(SolveFailure::Timeout)
                }
            },
            Err(e) => {
                let failure = classify(e);
                tracing::warn!(%failure, "Solver returned no solution");
                Err(failure)
            }
        }
    }
}

/// Maps a solver error onto the failure kinds callers act on.
pub fn classify(err: ResolutionError) -> SolveFailure {
    match err {
        ResolutionError::Infeasible => SolveFailure::Infeasible,
        ResolutionError::Unbounded => SolveFailure::Unbounded,
        other => SolveFailure::Solver(other.to_string()),
    }
}

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

pub mod baseline;
pub mod config;
pub mod err;
pub mod pipeline;
pub mod recipe;
pub mod session;
pub mod smoothing;
pub mod throughput;
pub mod vessel;

pub mod prelude {
    pub use crate::baseline::{BaselineOutcome, BaselineParams, BaselineScheduler};
    pub use crate::config::{ConfigError, PlannerConfig};
    pub use crate::err::{PipelineError, SolveFailure};
    pub use crate::pipeline::{PlanOutcome, Planner};
    pub use crate::recipe::catalogue::RecipeCatalogue;
    pub use crate::session::SolverSession;
    pub use crate::smoothing::{RateSmoother, SmoothingParams};
    pub use crate::throughput::{
        ThroughputOptimizer, ThroughputOutcome, ThroughputParams, ThroughputReport,
    };
    pub use crate::vessel::{
        VesselAllocation, VesselParams, VesselReport, VesselSolver, groups::CargoGroup,
    };
}

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
    baseline::BaselineScheduler,
    config::PlannerConfig,
    err::PipelineError,
    smoothing::RateSmoother,
    throughput::{ThroughputOptimizer, ThroughputReport},
    vessel::{VesselAllocation, VesselSolver},
};
use aegis_model::{
    prelude::{PlantInput, ScheduleDocument, VesselProgram},
    schedule::doc::HeldVesselDocument,
};

/// Everything one planning run produced.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    allocation: VesselAllocation,
    held: Vec<HeldVesselDocument>,
    throughput: ThroughputReport,
    smoothing_adjustments: Option<usize>,
    document: ScheduleDocument,
}

impl PlanOutcome {
    #[inline]
    pub fn allocation(&self) -> &VesselAllocation {
        &self.allocation
    }

    /// Vessels that never found ullage within the horizon.
    #[inline]
    pub fn held(&self) -> &[HeldVesselDocument] {
        &self.held
    }

    #[inline]
    pub fn throughput(&self) -> &ThroughputReport {
        &self.throughput
    }

    /// Number of smoother moves, `None` when smoothing is off.
    #[inline]
    pub fn smoothing_adjustments(&self) -> Option<usize> {
        self.smoothing_adjustments
    }

    #[inline]
    pub fn document(&self) -> &ScheduleDocument {
        &self.document
    }

    #[inline]
    pub fn into_document(self) -> ScheduleDocument {
        self.document
    }
}

/// Runs vessel allocation, the baseline schedule, throughput optimization
/// and optional smoothing in sequence.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    #[inline]
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    #[tracing::instrument(level = "info", skip_all, fields(parcels = program.parcels().len()))]
    pub fn plan(
        &self,
        program: &VesselProgram,
        plant: &PlantInput,
    ) -> Result<PlanOutcome, PipelineError> {
        let allocation = VesselSolver::new(self.config.vessel.clone())
            .solve(program)
            .map_err(PipelineError::Vessels)?;

        let baseline = BaselineScheduler::new(plant, self.config.baseline.clone())
            .build(&allocation.arrivals())?;
        let mut document = baseline.to_document();

        let throughput =
            ThroughputOptimizer::new(self.config.throughput.clone()).optimize_document(&mut document)?;
        if let ThroughputReport::Failed { message } = &throughput {
            tracing::warn!(%message, "Keeping the baseline schedule");
        }

        let smoothing_adjustments = if self.config.smooth {
            Some(RateSmoother::new(self.config.smoothing.clone()).smooth_document(&mut document)?)
        } else {
            None
        };

        Ok(PlanOutcome {
            allocation,
            held: baseline.held().to_vec(),
            throughput,
            smoothing_adjustments,
            document,
        })
    }
}

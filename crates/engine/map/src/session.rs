//! Viewport-driven sampling runs
//!
//! A [`SamplingSession`] is the object a map adapter keeps for the lifetime of
//! the view. Each viewport change starts a new run; when an older run finishes
//! after a newer one has started, its matrix is handed back as
//! [`RunOutcome::Superseded`] so the caller never draws stale terrain over
//! fresh terrain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::area::BoundingBox;
use crate::elevation::ElevationProvider;
use crate::error::SampleError;
use crate::matrix::ElevationMatrix;
use crate::sampler::{GridSampler, SamplePlan, SamplerConfig};

/// Identifies one sampling run within a session
#[derive(Debug, Clone)]
pub struct RunTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no newer run has been started in the session
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run finished and is still the latest one
    Completed(ElevationMatrix),
    /// A newer run started meanwhile; the matrix was dropped
    Superseded,
}

impl RunOutcome {
    pub fn into_matrix(self) -> Option<ElevationMatrix> {
        match self {
            RunOutcome::Completed(matrix) => Some(matrix),
            RunOutcome::Superseded => None,
        }
    }
}

/// Owns the elevation provider and sampler for one map view
pub struct SamplingSession {
    provider: Arc<dyn ElevationProvider>,
    sampler: GridSampler,
    latest: Arc<AtomicU64>,
}

impl SamplingSession {
    pub fn new(
        provider: Arc<dyn ElevationProvider>,
        config: SamplerConfig,
    ) -> Result<Self, SampleError> {
        Ok(Self {
            provider,
            sampler: GridSampler::new(config)?,
            latest: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn sampler(&self) -> &GridSampler {
        &self.sampler
    }

    pub fn provider(&self) -> &dyn ElevationProvider {
        self.provider.as_ref()
    }

    pub fn plan(&self, bbox: &BoundingBox) -> SamplePlan {
        self.sampler.plan(bbox)
    }

    /// Start a new run, invalidating every earlier ticket
    pub fn begin(&self) -> RunTicket {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        RunTicket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Sample `bbox` as a new run
    ///
    /// Progress is only forwarded while the run is current.
    pub async fn run<F>(&self, bbox: &BoundingBox, on_progress: F) -> Result<RunOutcome, SampleError>
    where
        F: FnMut(f64),
    {
        let ticket = self.begin();
        self.run_with_ticket(&ticket, bbox, on_progress).await
    }

    /// Sample `bbox` under a ticket obtained from [`SamplingSession::begin`]
    pub async fn run_with_ticket<F>(
        &self,
        ticket: &RunTicket,
        bbox: &BoundingBox,
        mut on_progress: F,
    ) -> Result<RunOutcome, SampleError>
    where
        F: FnMut(f64),
    {
        let matrix = self
            .sampler
            .sample(self.provider.as_ref(), bbox, |progress| {
                if ticket.is_current() {
                    on_progress(progress);
                }
            })
            .await?;

        if ticket.is_current() {
            Ok(RunOutcome::Completed(matrix))
        } else {
            tracing::debug!(generation = ticket.generation(), "Discarding superseded sampling run");
            Ok(RunOutcome::Superseded)
        }
    }
}

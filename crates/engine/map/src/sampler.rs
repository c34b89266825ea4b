//! Grid sampling of a viewport through a batch elevation lookup
//!
//! The sampler walks the box row by row from the northern edge southwards,
//! one row every `spacing_km`, and asks the provider for each row in batches
//! of at most `max_batch_samples`. Calls are strictly sequential with a fixed
//! pause after every batch so the remote rate limit is never exceeded.
//!
//! Two approximations are deliberate:
//!
//! - The number of samples per row is taken from the width of the top row and
//!   reused for every row further south.
//! - Intermediate batch endpoints are stepped west of the cursor by
//!   `max_batch_samples * spacing_km`; only the last batch of a row ends on the
//!   eastern edge.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::area::BoundingBox;
use crate::coords::{step_latitude, step_longitude, GeoCoord};
use crate::elevation::ElevationProvider;
use crate::error::SampleError;
use crate::matrix::ElevationMatrix;

/// Default distance between samples in kilometers
pub const DEFAULT_SPACING_KM: f64 = 0.5;

/// Default per-call sample cap
pub const DEFAULT_MAX_BATCH_SAMPLES: usize = 500;

/// Default pause after each lookup (one request per second)
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Parameters of a sampling run
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Distance between adjacent samples along both axes (km)
    pub spacing_km: f64,
    /// Largest number of samples requested in one lookup
    pub max_batch_samples: usize,
    /// Pause after every lookup
    pub pacing: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            spacing_km: DEFAULT_SPACING_KM,
            max_batch_samples: DEFAULT_MAX_BATCH_SAMPLES,
            pacing: DEFAULT_PACING,
        }
    }
}

impl SamplerConfig {
    pub fn with_spacing_km(mut self, spacing_km: f64) -> Self {
        self.spacing_km = spacing_km;
        self
    }

    pub fn with_max_batch_samples(mut self, max_batch_samples: usize) -> Self {
        self.max_batch_samples = max_batch_samples;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// A zero or negative spacing would never leave the first row
    pub fn validate(&self) -> Result<(), SampleError> {
        if !(self.spacing_km.is_finite() && self.spacing_km > 0.0) {
            return Err(SampleError::InvalidSpacing(self.spacing_km));
        }
        if self.max_batch_samples == 0 {
            return Err(SampleError::InvalidBatchSize);
        }
        Ok(())
    }
}

/// Shape and cost of a sampling run, computed without any lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePlan {
    pub rows: usize,
    pub samples_per_row: usize,
    pub lookups_per_row: usize,
    pub total_lookups: usize,
    pub total_samples: usize,
    /// Time spent in pacing delays alone
    pub estimated_duration: Duration,
}

/// Walks a bounding box and collects an [`ElevationMatrix`]
#[derive(Debug, Clone)]
pub struct GridSampler {
    config: SamplerConfig,
}

impl GridSampler {
    pub fn new(config: SamplerConfig) -> Result<Self, SampleError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Samples per row, frozen from the top edge of the box
    fn samples_per_row(&self, bbox: &BoundingBox) -> usize {
        (bbox.width_km() / self.config.spacing_km).floor() as usize
    }

    /// Batch sizes for one row, in request order
    fn row_batches(&self, samples_per_row: usize) -> Vec<usize> {
        let cap = self.config.max_batch_samples;
        let mut batches = Vec::new();
        let mut remaining = samples_per_row;
        while remaining > 0 {
            batches.push(remaining.min(cap));
            // Always the full cap, whatever the batch size was
            remaining = remaining.saturating_sub(cap);
        }
        batches
    }

    /// Number of rows the walk produces for `bbox`
    fn row_count(&self, bbox: &BoundingBox) -> usize {
        let mut west = bbox.north_west;
        let mut rows = 0;
        while west.lat >= bbox.south_west.lat {
            rows += 1;
            west = step_latitude(west, self.config.spacing_km);
        }
        rows
    }

    /// Describe the run `sample` would perform for `bbox`
    pub fn plan(&self, bbox: &BoundingBox) -> SamplePlan {
        let bbox = bbox.normalized();
        let samples_per_row = self.samples_per_row(&bbox);
        let lookups_per_row = samples_per_row.div_ceil(self.config.max_batch_samples);
        let rows = if samples_per_row == 0 {
            0
        } else {
            self.row_count(&bbox)
        };
        let total_lookups = rows * lookups_per_row;

        SamplePlan {
            rows,
            samples_per_row,
            lookups_per_row,
            total_lookups,
            total_samples: rows * samples_per_row,
            estimated_duration: paced_duration(self.config.pacing, total_lookups),
        }
    }

    /// Sample `bbox` through `provider`
    ///
    /// `on_progress` receives the processed share of the north-south extent
    /// (0 to 100) after every row. Any lookup failure aborts the run and is
    /// returned unchanged; nothing collected so far is kept.
    pub async fn sample<P, F>(
        &self,
        provider: &P,
        bbox: &BoundingBox,
        mut on_progress: F,
    ) -> Result<ElevationMatrix, SampleError>
    where
        P: ElevationProvider + ?Sized,
        F: FnMut(f64),
    {
        let bbox = bbox.normalized();
        let spacing = self.config.spacing_km;
        let cap = self.config.max_batch_samples;

        let total_km = bbox.height_km();
        let samples_per_row = self.samples_per_row(&bbox);

        if samples_per_row == 0 {
            tracing::debug!(width_km = bbox.width_km(), spacing, "Viewport narrower than one sample");
            on_progress(100.0);
            return Ok(ElevationMatrix::empty());
        }

        let batches = self.row_batches(samples_per_row);
        let mut rows = Vec::new();
        let mut west = bbox.north_west;
        let mut east = bbox.north_east;
        let mut processed_km = 0.0;

        while west.lat >= bbox.south_west.lat {
            tracing::debug!(
                row = rows.len(),
                progress = (processed_km / total_km * 100.0).min(100.0),
                "Sampling elevation row"
            );

            let row = self
                .sample_row(provider, west, east, &batches, spacing * cap as f64)
                .await?;
            rows.push(row);

            west = step_latitude(west, spacing);
            east = step_latitude(east, spacing);
            processed_km += spacing;
            on_progress((processed_km / total_km * 100.0).min(100.0));
        }

        tracing::debug!(rows = rows.len(), samples_per_row, "Elevation sampling complete");
        Ok(ElevationMatrix::from_rows(rows))
    }

    async fn sample_row<P>(
        &self,
        provider: &P,
        west: GeoCoord,
        east: GeoCoord,
        batches: &[usize],
        batch_span_km: f64,
    ) -> Result<Vec<f64>, SampleError>
    where
        P: ElevationProvider + ?Sized,
    {
        let mut row = Vec::new();
        let mut cursor = west;

        for (index, &count) in batches.iter().enumerate() {
            let last = index + 1 == batches.len();
            let end = if last {
                east
            } else {
                step_longitude(cursor, batch_span_km)
            };

            let samples = provider.elevation_along_path([cursor, end], count).await?;
            if samples.len() != count {
                return Err(SampleError::BatchLength {
                    expected: count,
                    actual: samples.len(),
                });
            }
            row.extend(samples.into_iter().map(|s| s.elevation));

            if !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }

            if !last {
                cursor = step_longitude(cursor, batch_span_km);
            }
        }

        Ok(row)
    }
}

/// `pacing` repeated `lookups` times, saturating at [`Duration::MAX`]
fn paced_duration(pacing: Duration, lookups: usize) -> Duration {
    let nanos = pacing.as_nanos().saturating_mul(lookups as u128);
    let subsec = (nanos % 1_000_000_000) as u32;
    u64::try_from(nanos / 1_000_000_000).map_or(Duration::MAX, |secs| Duration::new(secs, subsec))
}

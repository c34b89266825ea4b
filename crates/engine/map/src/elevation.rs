//! Elevation lookups
//!
//! The sampler talks to elevation sources through [`ElevationProvider`]: one
//! call asks for `samples` evenly spaced points along a two-point path and
//! returns them in path order. Remote services implement it over HTTP (see
//! [`crate::google`]); the providers in this module answer locally and are
//! used for offline runs and tests.

use async_trait::async_trait;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::coords::{interpolate_path, GeoCoord};
use crate::error::ElevationError;

/// Result type for elevation lookups
pub type ElevationResult<T> = Result<T, ElevationError>;

/// One elevation sample returned by a lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationSample {
    /// Elevation in meters relative to sea level
    pub elevation: f64,
    /// Where the sample was taken, if the provider reports it
    #[serde(default)]
    pub location: Option<GeoCoord>,
    /// Distance in meters between the data points the value was interpolated from
    #[serde(default)]
    pub resolution: Option<f64>,
}

impl ElevationSample {
    pub fn new(elevation: f64) -> Self {
        Self {
            elevation,
            location: None,
            resolution: None,
        }
    }

    pub fn at(location: GeoCoord, elevation: f64) -> Self {
        Self {
            elevation,
            location: Some(location),
            resolution: None,
        }
    }
}

/// Batch elevation lookup along a path
#[async_trait]
pub trait ElevationProvider: Send + Sync {
    /// Name of this provider, for diagnostics
    fn name(&self) -> &str;

    /// Elevations for `samples` evenly spaced points from `path[0]` to `path[1]`
    async fn elevation_along_path(
        &self,
        path: [GeoCoord; 2],
        samples: usize,
    ) -> ElevationResult<Vec<ElevationSample>>;
}

/// Provider that returns the same elevation everywhere
#[derive(Debug, Clone, Default)]
pub struct FlatElevationProvider {
    /// Constant elevation to return (meters)
    pub elevation: f64,
}

impl FlatElevationProvider {
    pub fn new(elevation: f64) -> Self {
        Self { elevation }
    }
}

#[async_trait]
impl ElevationProvider for FlatElevationProvider {
    fn name(&self) -> &str {
        "flat"
    }

    async fn elevation_along_path(
        &self,
        path: [GeoCoord; 2],
        samples: usize,
    ) -> ElevationResult<Vec<ElevationSample>> {
        Ok(interpolate_path(path, samples)
            .into_iter()
            .map(|location| ElevationSample::at(location, self.elevation))
            .collect())
    }
}

/// Offline terrain generated from fractal Perlin noise
///
/// Coastline and sea floor included: roughly a third of the surface lies
/// below sea level with the default settings.
#[derive(Debug, Clone)]
pub struct ProceduralElevationProvider {
    fbm: Fbm<Perlin>,
    /// Peak-to-mean relief in meters
    pub amplitude: f64,
    /// Elevation of the noise mean in meters
    pub base: f64,
}

impl ProceduralElevationProvider {
    pub fn new(seed: u32) -> Self {
        let fbm = Fbm::<Perlin>::new(seed)
            .set_octaves(6)
            .set_frequency(8.0)
            .set_persistence(0.5);

        Self {
            fbm,
            amplitude: 2000.0,
            base: 300.0,
        }
    }

    pub fn with_relief(mut self, base: f64, amplitude: f64) -> Self {
        self.base = base;
        self.amplitude = amplitude;
        self
    }

    /// Elevation at a single coordinate
    pub fn elevation_at(&self, coord: &GeoCoord) -> f64 {
        self.base + self.amplitude * self.fbm.get([coord.lng, coord.lat])
    }
}

impl Default for ProceduralElevationProvider {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ElevationProvider for ProceduralElevationProvider {
    fn name(&self) -> &str {
        "procedural"
    }

    async fn elevation_along_path(
        &self,
        path: [GeoCoord; 2],
        samples: usize,
    ) -> ElevationResult<Vec<ElevationSample>> {
        Ok(interpolate_path(path, samples)
            .into_iter()
            .map(|location| ElevationSample::at(location, self.elevation_at(&location)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flat_provider() {
        let provider = FlatElevationProvider::new(100.0);
        let path = [GeoCoord::new(45.0, -122.0), GeoCoord::new(45.0, -121.0)];

        let samples = provider.elevation_along_path(path, 5).await.unwrap();
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.elevation == 100.0));
        assert_eq!(samples[0].location, Some(path[0]));
        assert_eq!(samples[4].location, Some(path[1]));
    }

    #[tokio::test]
    async fn test_procedural_provider_deterministic() {
        let path = [GeoCoord::new(27.9, 86.8), GeoCoord::new(27.9, 86.9)];

        let a = ProceduralElevationProvider::new(7)
            .elevation_along_path(path, 32)
            .await
            .unwrap();
        let b = ProceduralElevationProvider::new(7)
            .elevation_along_path(path, 32)
            .await
            .unwrap();

        assert_eq!(a.len(), 32);
        assert_eq!(a, b);
        assert!(a.iter().all(|s| s.elevation.is_finite()));
    }

    #[test]
    fn test_procedural_relief() {
        let provider = ProceduralElevationProvider::new(1).with_relief(0.0, 0.0);
        assert_eq!(provider.elevation_at(&GeoCoord::new(10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_sample_json_without_location() {
        let sample: ElevationSample = serde_json::from_str(r#"{"elevation": 12.5}"#).unwrap();
        assert_eq!(sample, ElevationSample::new(12.5));
    }
}

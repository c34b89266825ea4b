//! Terrain sampling for Relief
//!
//! This crate turns a map viewport into a displaced terrain mesh: it walks the
//! viewport on a geodesic grid, fetches elevations through a rate-limited batch
//! lookup, and converts the resulting elevation matrix into vertex heights.
//!
//! # Modules
//!
//! - [`coords`]: Coordinates, haversine distance and geodesic stepping
//! - [`area`]: Four-corner bounding boxes and Web Mercator viewports
//! - [`elevation`]: Elevation lookup trait and local providers
//! - [`google`]: Google Maps Elevation API provider (feature `google`)
//! - [`sampler`]: Batched, paced grid sampling with progress reporting
//! - [`matrix`]: Row-major elevation grids
//! - [`heightmap`]: Quantized displacements and terrain meshes
//! - [`session`]: Viewport sessions that discard superseded runs
//! - [`location`]: Location presets and map URL parsing

pub mod area;
pub mod coords;
pub mod elevation;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod heightmap;
pub mod location;
pub mod matrix;
pub mod sampler;
pub mod session;

pub use area::{BoundingBox, Viewport};
pub use coords::GeoCoord;
pub use elevation::{
    ElevationProvider, ElevationSample, FlatElevationProvider, ProceduralElevationProvider,
};
pub use error::{ElevationError, LocationError, MeshError, SampleError};
pub use heightmap::{build_displacements, HeightmapOptions, TerrainMesh};
pub use location::Location;
pub use matrix::ElevationMatrix;
pub use sampler::{GridSampler, SamplePlan, SamplerConfig};
pub use session::{RunOutcome, RunTicket, SamplingSession};

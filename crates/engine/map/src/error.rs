//! Error types for elevation sampling and meshing

use thiserror::Error;

/// Errors raised by an elevation lookup
#[derive(Error, Debug)]
pub enum ElevationError {
    /// Transport-level failure talking to the remote service
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered but refused the request
    #[error("Elevation request rejected ({status}): {message}")]
    Rejected { status: String, message: String },

    /// The response could not be decoded
    #[error("Malformed elevation response: {0}")]
    Malformed(String),

    /// No API key was configured for a provider that needs one
    #[error("Missing API key for elevation service")]
    MissingApiKey,
}

#[cfg(feature = "google")]
impl From<reqwest::Error> for ElevationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ElevationError::Malformed(err.to_string())
        } else {
            ElevationError::Network(err.to_string())
        }
    }
}

/// Errors that abort a sampling run
#[derive(Error, Debug)]
pub enum SampleError {
    /// The elevation lookup failed; the original error is kept as-is
    #[error(transparent)]
    Lookup(#[from] ElevationError),

    /// The lookup returned a different number of samples than requested
    #[error("Lookup returned {actual} samples, expected {expected}")]
    BatchLength { expected: usize, actual: usize },

    /// Sample spacing must be a positive, finite distance
    #[error("Invalid sample spacing: {0} km")]
    InvalidSpacing(f64),

    /// Batch cap must allow at least one sample per lookup
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

/// Errors raised while assembling a terrain mesh
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A surface needs at least two rows and two columns
    #[error("Elevation matrix too small for a mesh: {rows}x{cols}")]
    TooSmall { rows: usize, cols: usize },

    /// Row lengths differ
    #[error("Row {row} has {actual} samples, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while resolving a location into a viewport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Invalid map URL format: {0}")]
    InvalidUrl(String),

    #[error("Unknown location preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}

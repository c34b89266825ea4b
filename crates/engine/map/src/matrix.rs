//! Row-major elevation grids produced by a sampling run

use serde::{Deserialize, Serialize};

/// Elevation samples in meters, rows north to south, each row west to east
///
/// A matrix is built once per sampling run and not modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationMatrix {
    rows: Vec<Vec<f64>>,
}

impl ElevationMatrix {
    /// A matrix with no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }

    /// Number of rows (north-south samples)
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Samples in the first row (east-west samples)
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Total number of samples across all rows
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// True when every row has the same length
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|row| row.len() == width)
    }

    /// Elevation at a grid position
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    /// All samples in row-major order
    pub fn cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flatten().copied()
    }

    /// Minimum and maximum elevation, `None` for an empty matrix
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.cells().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
    }
}

//! Elevation matrix to mesh displacement
//!
//! Every sample goes through the same three steps: round to the nearest
//! [`QUANTIZATION_STEP_M`], optionally clamp below-sea-level values to zero,
//! then multiply by the vertical scale. [`TerrainMesh`] lays the result out as
//! a plane grid with one vertex per sample.

use glam::Vec3;
use std::io::{self, Write};

use crate::error::MeshError;
use crate::matrix::ElevationMatrix;

/// Elevation banding step in meters
pub const QUANTIZATION_STEP_M: f64 = 25.0;

/// Vertical field of view the camera distance is fitted for (degrees)
pub const CAMERA_FOV_DEG: f32 = 45.0;

/// How elevations become vertex displacements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightmapOptions {
    /// Vertical exaggeration
    pub scale: f64,
    /// Keep negative elevations instead of flattening them to sea level
    pub include_below_sea_level: bool,
}

impl Default for HeightmapOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            include_below_sea_level: false,
        }
    }
}

impl HeightmapOptions {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_below_sea_level(mut self, include: bool) -> Self {
        self.include_below_sea_level = include;
        self
    }
}

/// Round to the nearest quantization step, halves rounding up
pub fn quantize(elevation: f64) -> f64 {
    (elevation / QUANTIZATION_STEP_M + 0.5).floor() * QUANTIZATION_STEP_M
}

/// Displacement for a single elevation sample
pub fn displacement(elevation: f64, scale: f64, include_below_sea_level: bool) -> f64 {
    let quantized = quantize(elevation);
    let adjusted = if !include_below_sea_level && quantized < 0.0 {
        0.0
    } else {
        quantized
    };
    adjusted * scale
}

/// One displacement per matrix cell, row-major
pub fn build_displacements(
    matrix: &ElevationMatrix,
    scale: f64,
    include_below_sea_level: bool,
) -> Vec<f32> {
    matrix
        .cells()
        .map(|e| displacement(e, scale, include_below_sea_level) as f32)
        .collect()
}

/// Displaced plane mesh, centered on the origin with Z up
///
/// Vertices run row by row from the north-west corner, matching the matrix
/// layout. X grows east, Y grows north.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub columns: usize,
    pub rows: usize,
    /// Plane extent in meters (east-west, north-south)
    pub width_m: f32,
    pub height_m: f32,
}

impl TerrainMesh {
    /// Build a mesh from a rectangular matrix of at least 2x2 samples
    pub fn build(
        matrix: &ElevationMatrix,
        spacing_km: f64,
        options: &HeightmapOptions,
    ) -> Result<Self, MeshError> {
        let rows = matrix.height();
        let columns = matrix.width();
        if rows < 2 || columns < 2 {
            return Err(MeshError::TooSmall {
                rows,
                cols: columns,
            });
        }
        if let Some((row, r)) = matrix
            .rows()
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns)
        {
            return Err(MeshError::Ragged {
                row,
                expected: columns,
                actual: r.len(),
            });
        }

        let spacing_m = (spacing_km * 1000.0) as f32;
        let width_m = columns as f32 * spacing_m;
        let height_m = rows as f32 * spacing_m;
        let segment_w = width_m / (columns - 1) as f32;
        let segment_h = height_m / (rows - 1) as f32;

        let displacements =
            build_displacements(matrix, options.scale, options.include_below_sea_level);

        let mut positions = Vec::with_capacity(rows * columns);
        for iy in 0..rows {
            let y = height_m / 2.0 - iy as f32 * segment_h;
            for ix in 0..columns {
                let x = ix as f32 * segment_w - width_m / 2.0;
                positions.push(Vec3::new(x, y, displacements[iy * columns + ix]));
            }
        }

        let mut indices = Vec::with_capacity((rows - 1) * (columns - 1) * 6);
        let stride = columns as u32;
        for iy in 0..(rows - 1) as u32 {
            for ix in 0..(columns - 1) as u32 {
                let a = ix + stride * iy;
                let b = ix + stride * (iy + 1);
                let c = ix + 1 + stride * (iy + 1);
                let d = ix + 1 + stride * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        let normals = vertex_normals(&positions, &indices);

        Ok(Self {
            positions,
            normals,
            indices,
            columns,
            rows,
            width_m,
            height_m,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Camera distance at which the plane's north-south extent fills a
    /// [`CAMERA_FOV_DEG`] view
    pub fn camera_distance(&self) -> f32 {
        self.height_m / 2.0 / (CAMERA_FOV_DEG.to_radians() / 2.0).tan()
    }

    /// Write the mesh as Wavefront OBJ
    pub fn write_obj<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# relief terrain {}x{}", self.columns, self.rows)?;
        for p in &self.positions {
            writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for n in &self.normals {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }
        Ok(())
    }
}

/// Area-weighted smooth normals
fn vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[c] - positions[b]).cross(positions[a] - positions[b]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Z))
        .collect()
}

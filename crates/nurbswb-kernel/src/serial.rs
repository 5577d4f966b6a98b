//! Flat pole-array exchange format.
//!
//! A grid is written as one JSON object holding a flat `[x, y, z, w, ...]`
//! array, row-major, so hosts can persist a surface without knowing the
//! in-memory layout.

use serde::{Deserialize, Serialize};

use crate::error::{NurbsError, Result};
use crate::grid::{pole_count, ControlGrid};
use crate::pole::WeightedPoint;

/// Current format version.
pub const POLE_ARRAY_VERSION: u32 = 1;

/// Values per pole: x, y, z, weight.
pub const POLE_STRIDE: usize = 4;

/// Serialized pole grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleArray {
    /// Format version.
    pub version: u32,
    /// Pole count along u.
    pub n_u: usize,
    /// Pole count along v.
    pub n_v: usize,
    /// Values per pole.
    pub stride: usize,
    /// Flat pole data, row-major.
    pub data: Vec<f64>,
}

impl PoleArray {
    /// Capture the current poles of a grid.
    pub fn from_grid(grid: &ControlGrid) -> Self {
        let data = grid
            .poles()
            .iter()
            .flat_map(|p| [p.point.x, p.point.y, p.point.z, p.weight])
            .collect();
        Self {
            version: POLE_ARRAY_VERSION,
            n_u: grid.n_u(),
            n_v: grid.n_v(),
            stride: POLE_STRIDE,
            data,
        }
    }

    /// Rebuild a grid. The base snapshot starts equal to the poles.
    pub fn to_grid(&self) -> Result<ControlGrid> {
        if self.version != POLE_ARRAY_VERSION {
            return Err(NurbsError::InvalidPoleArray(format!(
                "unsupported version {}",
                self.version
            )));
        }
        if self.stride != POLE_STRIDE {
            return Err(NurbsError::InvalidPoleArray(format!(
                "stride {} (expected {})",
                self.stride, POLE_STRIDE
            )));
        }
        let expected = pole_count(self.n_u, self.n_v)?
            .checked_mul(POLE_STRIDE)
            .ok_or_else(|| {
                NurbsError::InvalidPoleArray(format!(
                    "{}x{} grid is too large",
                    self.n_u, self.n_v
                ))
            })?;
        if self.data.len() != expected {
            return Err(NurbsError::InvalidPoleArray(format!(
                "{} values for a {}x{} grid (expected {})",
                self.data.len(),
                self.n_u,
                self.n_v,
                expected
            )));
        }
        let poles = self
            .data
            .chunks_exact(POLE_STRIDE)
            .map(|c| WeightedPoint::from([c[0], c[1], c[2], c[3]]))
            .collect();
        ControlGrid::new(poles, self.n_u, self.n_v)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| NurbsError::InvalidPoleArray(e.to_string()))
    }

    /// Parse from JSON. Structure is checked by [`PoleArray::to_grid`].
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| NurbsError::InvalidPoleArray(e.to_string()))
    }
}

impl ControlGrid {
    /// Export the poles as a [`PoleArray`].
    pub fn to_pole_array(&self) -> PoleArray {
        PoleArray::from_grid(self)
    }

    /// Import a grid from a [`PoleArray`].
    pub fn from_pole_array(array: &PoleArray) -> Result<Self> {
        array.to_grid()
    }
}

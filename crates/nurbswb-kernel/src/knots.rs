//! Clamped knot vectors derived from pole count and degree.

use serde::{Deserialize, Serialize};

use crate::error::{NurbsError, Result};

/// Highest supported polynomial degree.
pub const MAX_DEGREE: usize = 3;

/// Knot description for one parametric direction.
///
/// Knot values are distinct and strictly increasing; repetition is carried
/// in `mults`, the way CAD kernels exchange B-spline data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnotSpec {
    /// Polynomial degree.
    pub degree: usize,
    /// Distinct knot values.
    pub knots: Vec<f64>,
    /// Multiplicity of each knot value.
    pub mults: Vec<usize>,
}

impl KnotSpec {
    /// Clamped uniform knots for `pole_count` poles of the given degree.
    pub fn clamped(pole_count: usize, degree: usize) -> Result<Self> {
        let (knots, mults) = build(pole_count, degree)?;
        Ok(Self {
            degree,
            knots,
            mults,
        })
    }

    /// Sum of all multiplicities.
    pub fn total_multiplicity(&self) -> usize {
        self.mults.iter().sum()
    }

    /// Expand into a flat knot vector (each value repeated by its multiplicity).
    pub fn flatten(&self) -> Vec<f64> {
        flatten(&self.knots, &self.mults)
    }

    /// Parameter domain `(first knot, last knot)`.
    pub fn domain(&self) -> (f64, f64) {
        match (self.knots.first(), self.knots.last()) {
            (Some(&a), Some(&b)) => (a, b),
            _ => (0.0, 0.0),
        }
    }
}

/// Check a degree against the supported range.
pub fn check_degree(degree: usize) -> Result<()> {
    if (1..=MAX_DEGREE).contains(&degree) {
        Ok(())
    } else {
        Err(NurbsError::InvalidDegree(degree))
    }
}

/// Build distinct knot values and multiplicities for a clamped B-spline.
///
/// `pole_count - degree + 1` evenly spaced values on `[0, 1]`; the end
/// values carry multiplicity `degree + 1`, interior values 1, so the
/// multiplicities sum to `pole_count + degree + 1`.
pub fn build(pole_count: usize, degree: usize) -> Result<(Vec<f64>, Vec<usize>)> {
    check_degree(degree)?;
    if pole_count < degree + 1 {
        return Err(NurbsError::InsufficientPoles {
            poles: pole_count,
            degree,
        });
    }

    let spans = pole_count - degree;
    let knots: Vec<f64> = (0..=spans).map(|i| i as f64 / spans as f64).collect();

    let mut mults = vec![1; knots.len()];
    mults[0] = degree + 1;
    mults[spans] = degree + 1;

    Ok((knots, mults))
}

/// Expand distinct knots with multiplicities into a flat knot vector.
pub fn flatten(knots: &[f64], mults: &[usize]) -> Vec<f64> {
    knots
        .iter()
        .zip(mults)
        .flat_map(|(&k, &m)| std::iter::repeat(k).take(m))
        .collect()
}

#![warn(missing_docs)]

//! Math types for the nurbswb surface kernel.
//!
//! Thin wrappers around nalgebra providing the point and vector types
//! used by the control grid and the evaluator, plus tolerance constants.

use nalgebra::Vector3;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Linear interpolation between two points: `(1 - t) * a + t * b`.
pub fn lerp_point(a: &Point3, b: &Point3, t: f64) -> Point3 {
    Point3::from(a.coords * (1.0 - t) + b.coords * t)
}

/// Linear interpolation between two scalars.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (1.0 - t) * a + t * b
}

/// Distance from `p` to the Z axis.
pub fn radial_distance(p: &Point3) -> f64 {
    (p.x * p.x + p.y * p.y).sqrt()
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
    /// Tolerance on parameter values (knots, `u`/`v`).
    pub parametric: f64,
}

impl Tolerance {
    /// Default tolerances (1e-9 linear, 1e-12 parametric).
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        parametric: 1e-12,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if a parameter value lies in `[lo, hi]`, allowing for rounding.
    pub fn param_in_range(&self, t: f64, lo: f64, hi: f64) -> bool {
        t >= lo - self.parametric && t <= hi + self.parametric
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

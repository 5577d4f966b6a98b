//! Weighted control points.

use nurbswb_math::{lerp, lerp_point, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{NurbsError, Result};

/// A weighted control point (pole).
///
/// Position is stored in Cartesian coordinates; the weight is kept
/// separately. A weight other than 1 makes the surface rational.
/// Serializes as `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct WeightedPoint {
    /// 3D position (not premultiplied by the weight).
    pub point: Point3,
    /// Weight (must be > 0).
    pub weight: f64,
}

impl WeightedPoint {
    /// Create a weighted point.
    pub fn new(point: Point3, weight: f64) -> Self {
        Self { point, weight }
    }

    /// Create with unit weight.
    pub fn unweighted(point: Point3) -> Self {
        Self { point, weight: 1.0 }
    }

    /// Create from raw coordinates with unit weight.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::unweighted(Point3::new(x, y, z))
    }

    /// Convert to homogeneous coordinates: `(w*x, w*y, w*z, w)`.
    pub fn to_homogeneous(&self) -> [f64; 4] {
        [
            self.weight * self.point.x,
            self.weight * self.point.y,
            self.weight * self.point.z,
            self.weight,
        ]
    }

    /// Blend position and weight: `(1 - t) * self + t * other`.
    pub fn blend(&self, other: &WeightedPoint, t: f64) -> Self {
        Self {
            point: lerp_point(&self.point, &other.point, t),
            weight: lerp(self.weight, other.weight, t),
        }
    }

    /// Blend only x and y; z is set to 0 and the weight to 1.
    pub fn blend_flat(&self, other: &WeightedPoint, t: f64) -> Self {
        Self::at(
            lerp(self.point.x, other.point.x, t),
            lerp(self.point.y, other.point.y, t),
            0.0,
        )
    }
}

impl Default for WeightedPoint {
    fn default() -> Self {
        Self::unweighted(Point3::origin())
    }
}

impl From<[f64; 4]> for WeightedPoint {
    fn from(v: [f64; 4]) -> Self {
        Self::new(Point3::new(v[0], v[1], v[2]), v[3])
    }
}

impl From<WeightedPoint> for [f64; 4] {
    fn from(p: WeightedPoint) -> Self {
        [p.point.x, p.point.y, p.point.z, p.weight]
    }
}

/// Reject weights that would break the rational form.
pub fn check_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(NurbsError::InvalidWeight(weight))
    }
}

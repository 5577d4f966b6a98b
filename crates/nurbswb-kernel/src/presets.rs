//! Shape presets: alternative pole-coordinate generators.
//!
//! The cylinder and sphere presets read the flat pole grid as parameter
//! space: x becomes the angle, y the height or latitude, and z a radial
//! offset. Height edits on the flat grid therefore turn into radial bumps.
//! All mappings are pure: they return new coordinates and never touch the
//! model they were called for.

use std::f64::consts::PI;

use nurbswb_math::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{NurbsError, Result};
use crate::knots::KnotSpec;
use crate::pole::WeightedPoint;

/// Cylinder base radius.
pub const CYLINDER_RADIUS: f64 = 400.0;
/// Extra cylinder radius at full radial offset.
pub const CYLINDER_RADIUS_RANGE: f64 = 200.0;
/// Cylinder height.
pub const CYLINDER_HEIGHT: f64 = 2000.0;
/// Sphere base radius.
pub const SPHERE_RADIUS: f64 = 400.0;
/// Radius lost at full radial offset on the sphere.
pub const SPHERE_RADIUS_RANGE: f64 = 60.0;

/// Which pole-coordinate generator a surface uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Poles used as-is.
    #[default]
    Free,
    /// Poles wrapped around the Z axis.
    Cylinder,
    /// Poles mapped onto a sphere.
    Sphere,
    /// Fixed 7x4 torus control mesh.
    Torus,
}

impl ShapeKind {
    /// Whether the shape wraps around in u (the seam is duplicated, not periodic).
    pub fn is_closed_u(self) -> bool {
        matches!(self, ShapeKind::Cylinder | ShapeKind::Sphere | ShapeKind::Torus)
    }
}

/// Normalize values to `[0, 1]`; a zero range is an error.
fn normalize(values: &[f64], axis: &'static str) -> Result<Vec<f64>> {
    let (min, max) = min_max(values);
    let range = max - min;
    if range.is_nan() || range <= 0.0 {
        return Err(NurbsError::DegenerateGrid { axis });
    }
    Ok(values.iter().map(|x| (x - min) / range).collect())
}

/// Normalize radial offsets; a flat input means no offset at all.
fn normalize_offset(values: &[f64]) -> Vec<f64> {
    let (min, max) = min_max(values);
    let range = max - min;
    if range > 0.0 {
        values.iter().map(|x| (x - min) / range).collect()
    } else {
        vec![0.0; values.len()]
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
}

fn split_axes(points: &[Point3]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let xs = points.iter().map(|p| p.x).collect();
    let ys = points.iter().map(|p| p.y).collect();
    let zs = points.iter().map(|p| p.z).collect();
    (xs, ys, zs)
}

/// Wrap grid coordinates around the Z axis.
///
/// x is normalized to an angle in `[0, 2*PI]`, y to a height fraction and z
/// to a radius fraction; output is `(r sin a, r cos a, H h)` with
/// `r = 400 + 200 * radius_fraction` and `H = 2000`.
pub fn cylinder_coords(points: &[Point3]) -> Result<Vec<Point3>> {
    let (xs, ys, zs) = split_axes(points);
    let angles = normalize(&xs, "x")?;
    let heights = normalize(&ys, "y")?;
    let offsets = normalize_offset(&zs);

    Ok(angles
        .iter()
        .zip(&heights)
        .zip(&offsets)
        .map(|((&a, &h), &f)| {
            let angle = a * 2.0 * PI;
            let r = CYLINDER_RADIUS + CYLINDER_RADIUS_RANGE * f;
            Point3::new(r * angle.sin(), r * angle.cos(), CYLINDER_HEIGHT * h)
        })
        .collect())
}

/// Map grid coordinates onto a sphere.
///
/// x becomes the longitude in `[0, 2*PI]`, y the latitude in
/// `[-PI/2, PI/2]` and z a radius fraction with `r = 400 - 60 * fraction`.
pub fn sphere_coords(points: &[Point3]) -> Result<Vec<Point3>> {
    let (xs, ys, zs) = split_axes(points);
    let longitudes = normalize(&xs, "x")?;
    let latitudes = normalize(&ys, "y")?;
    let offsets = normalize_offset(&zs);

    Ok(longitudes
        .iter()
        .zip(&latitudes)
        .zip(&offsets)
        .map(|((&lon, &lat), &f)| {
            let theta = lon * 2.0 * PI;
            let phi = (lat - 0.5) * PI;
            let r = SPHERE_RADIUS - SPHERE_RADIUS_RANGE * f;
            Point3::new(
                r * theta.cos() * phi.cos(),
                r * theta.sin() * phi.cos(),
                r * phi.sin(),
            )
        })
        .collect())
}

/// Hand-authored torus control mesh, indexed `[u * 4 + v]`, before scaling.
const TORUS_TABLE: [[f64; 3]; 28] = [
    [20.0, 0.0, -40.0],
    [60.0, 0.0, -40.0],
    [30.0, 0.0, 50.0],
    [0.0, 0.0, -40.0],
    [20.0, 10.0, -40.0],
    [40.0, 10.0, -40.0],
    [40.0, 10.0, 55.0],
    [0.0, 10.0, -40.0],
    [20.0, 15.0, -40.0],
    [65.0, 15.0, -40.0],
    [60.0, 15.0, 75.0],
    [35.0, 15.0, -40.0],
    [0.0, 20.0, 10.0],
    [0.0, 40.0, 20.0],
    [0.0, 45.0, 65.0],
    [0.0, 20.0, 20.0],
    [-20.0, 0.0, 0.0],
    [-40.0, 0.0, 20.0],
    [-70.0, 0.0, 75.0],
    [-20.0, 0.0, 40.0],
    [-30.0, -10.0, 5.0],
    [-40.0, -10.0, 20.0],
    [-40.0, -10.0, 55.0],
    [-20.0, -20.0, 40.0],
    [5.0, -20.0, 5.0],
    [0.0, -40.0, 30.0],
    [0.0, -45.0, 65.0],
    [5.0, -20.0, 10.0],
];

/// Scale applied to the torus table.
pub const TORUS_SCALE: f64 = 10.0;

/// The torus preset: a periodic, bicubic 7x4 control mesh.
#[derive(Debug, Clone)]
pub struct TorusPreset {
    /// Poles, row-major (`v * n_u + u`).
    pub poles: Vec<WeightedPoint>,
    /// Pole count along u.
    pub n_u: usize,
    /// Pole count along v.
    pub n_v: usize,
    /// Periodic knots along u.
    pub knots_u: KnotSpec,
    /// Periodic knots along v.
    pub knots_v: KnotSpec,
}

/// Build the torus preset.
pub fn torus() -> TorusPreset {
    let (n_u, n_v) = (7, 4);
    let mut poles = Vec::with_capacity(n_u * n_v);
    for v in 0..n_v {
        for u in 0..n_u {
            let [x, y, z] = TORUS_TABLE[u * n_v + v];
            poles.push(WeightedPoint::at(
                x * TORUS_SCALE,
                y * TORUS_SCALE,
                z * TORUS_SCALE,
            ));
        }
    }
    TorusPreset {
        poles,
        n_u,
        n_v,
        knots_u: KnotSpec {
            degree: 3,
            knots: vec![0.0, 0.2, 0.4, 0.5, 0.7, 0.8, 1.0],
            mults: vec![2, 1, 1, 1, 1, 1, 2],
        },
        knots_v: KnotSpec {
            degree: 3,
            knots: vec![0.0, 0.4, 0.6, 1.0],
            mults: vec![2, 1, 1, 2],
        },
    }
}

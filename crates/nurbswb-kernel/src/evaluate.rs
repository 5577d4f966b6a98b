//! Rational B-spline surface evaluation.
//!
//! Evaluates a [`SurfaceDescriptor`] with the Cox-de Boor recurrence in
//! both directions and the standard tensor-product NURBS quotient
//! `S(u,v) = sum N_i(u) N_j(v) w_ij P_ij / sum N_i(u) N_j(v) w_ij`.
//! Periodic directions are unwrapped into an equivalent non-periodic knot
//! vector with the first `degree` poles repeated at the end.

use nurbswb_math::{Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{NurbsError, Result};
use crate::knots::KnotSpec;
use crate::model::SurfaceDescriptor;

/// Parameter step for curvature estimates, as a fraction of the domain.
pub const CURVATURE_STEP: f64 = 1e-4;

// =============================================================================
// Knot vector utilities
// =============================================================================

/// Find the knot span index for parameter `t`.
///
/// Returns `i` such that `knots[i] <= t < knots[i+1]`, clamped to valid range.
/// For `t` at the end of the domain, returns the last valid span.
fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    // n = number of control points - 1 (last index)
    if t >= knots[n + 1] {
        return n;
    }
    if t < knots[degree] {
        return degree;
    }
    // t == knots[degree] falls through so repeated knots pick the
    // first non-empty span
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Non-zero basis function values `N[span-degree..=span]` at `t`.
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-30 {
                // zero-length knot interval
                n[r] = saved;
                saved = 0.0;
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

/// One parametric direction, ready for evaluation.
#[derive(Debug, Clone)]
struct Axis {
    degree: usize,
    /// Flat, non-periodic knot vector. Length = `count + degree + 1`.
    knots: Vec<f64>,
    /// Number of poles after unwrapping.
    count: usize,
    /// Number of distinct poles in the descriptor.
    source_count: usize,
    domain: (f64, f64),
}

impl Axis {
    fn new(spec: &KnotSpec, n: usize, periodic: bool) -> Self {
        let p = spec.degree;
        if !periodic {
            let knots = spec.flatten();
            let domain = (knots[p], knots[n]);
            return Self {
                degree: p,
                knots,
                count: n,
                source_count: n,
                domain,
            };
        }

        // One period of flat knots: every multiplicity except the seam's repeat.
        let last = spec.knots.len() - 1;
        let period = spec.knots[last] - spec.knots[0];
        let base = crate::knots::flatten(&spec.knots[..last], &spec.mults[..last]);
        let knots = (0..n + 2 * p + 1)
            .map(|j| {
                let idx = j as isize - p as isize;
                let k = base[idx.rem_euclid(n as isize) as usize];
                k + period * idx.div_euclid(n as isize) as f64
            })
            .collect::<Vec<_>>();
        let domain = (knots[p], knots[n + p]);
        Self {
            degree: p,
            knots,
            count: n + p,
            source_count: n,
            domain,
        }
    }

    /// Span and basis values at `t`.
    fn basis(&self, t: f64) -> (usize, Vec<f64>) {
        let t = t.clamp(self.domain.0, self.domain.1);
        let span = find_span(&self.knots, self.count - 1, self.degree, t);
        (span, basis_functions(&self.knots, span, self.degree, t))
    }
}

/// Which parameter an isoparametric curve holds fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsoDirection {
    /// `u` fixed, `v` varies.
    ConstU,
    /// `v` fixed, `u` varies.
    ConstV,
}

/// A sampled isoparametric curve.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoCurve {
    /// Which parameter is fixed.
    pub direction: IsoDirection,
    /// Value of the fixed parameter.
    pub parameter: f64,
    /// Evaluated points, in order of the varying parameter.
    pub points: Vec<Point3>,
}

/// Finite-difference curvature along the two parameter directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curvature {
    /// Curvature along the u tangent.
    pub ku: f64,
    /// Curvature along the v tangent.
    pub kv: f64,
}

impl Curvature {
    /// Radii of curvature; `None` where the curvature is zero.
    pub fn radii(&self) -> (Option<f64>, Option<f64>) {
        let r = |k: f64| if k != 0.0 { Some(1.0 / k) } else { None };
        (r(self.ku), r(self.kv))
    }
}

/// Evaluator for one built surface.
///
/// Holds only data derived from the descriptor, so every call is
/// independent and repeatable.
#[derive(Debug, Clone)]
pub struct SurfaceEvaluator {
    /// Homogeneous poles `(w*x, w*y, w*z, w)`, row-major over the unwrapped grid.
    poles: Vec<[f64; 4]>,
    u: Axis,
    v: Axis,
    tol: Tolerance,
}

impl SurfaceEvaluator {
    /// Prepare a descriptor for evaluation.
    pub fn new(descriptor: &SurfaceDescriptor) -> Result<Self> {
        descriptor.validate()?;
        let u = Axis::new(&descriptor.knot_spec_u(), descriptor.n_u, descriptor.periodic_u);
        let v = Axis::new(&descriptor.knot_spec_v(), descriptor.n_v, descriptor.periodic_v);

        let mut poles = Vec::with_capacity(u.count * v.count);
        for j in 0..v.count {
            for i in 0..u.count {
                let src = (j % v.source_count) * descriptor.n_u + (i % u.source_count);
                poles.push(descriptor.poles[src].to_homogeneous());
            }
        }

        Ok(Self {
            poles,
            u,
            v,
            tol: Tolerance::DEFAULT,
        })
    }

    /// Parameter domain as `((u_min, u_max), (v_min, v_max))`.
    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (self.u.domain, self.v.domain)
    }

    fn check_params(&self, u: f64, v: f64) -> Result<()> {
        let ((u0, u1), (v0, v1)) = self.domain();
        if self.tol.param_in_range(u, u0, u1) && self.tol.param_in_range(v, v0, v1) {
            Ok(())
        } else {
            Err(NurbsError::ParameterOutOfRange { u, v })
        }
    }

    /// Evaluate the surface at `(u, v)`.
    ///
    /// Parameters outside the domain are rejected, not clamped.
    pub fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        self.check_params(u, v)?;
        Ok(self.eval(u, v))
    }

    fn eval(&self, u: f64, v: f64) -> Point3 {
        let (span_u, basis_u) = self.u.basis(u);
        let (span_v, basis_v) = self.v.basis(v);

        let mut h = [0.0; 4];
        for (j, &bv) in basis_v.iter().enumerate() {
            let row = (span_v - self.v.degree + j) * self.u.count;
            for (i, &bu) in basis_u.iter().enumerate() {
                let w = bu * bv;
                let p = &self.poles[row + span_u - self.u.degree + i];
                h[0] += w * p[0];
                h[1] += w * p[1];
                h[2] += w * p[2];
                h[3] += w * p[3];
            }
        }

        if h[3].abs() < 1e-30 {
            Point3::origin()
        } else {
            Point3::new(h[0] / h[3], h[1] / h[3], h[2] / h[3])
        }
    }

    /// Partial derivative with respect to u (central difference).
    pub fn deriv_u(&self, u: f64, v: f64) -> Vec3 {
        let (u_min, u_max) = self.u.domain;
        let du = (u_max - u_min) * 1e-7;
        let u0 = (u - du).max(u_min);
        let u1 = (u + du).min(u_max);
        (self.eval(u1, v) - self.eval(u0, v)) / (u1 - u0)
    }

    /// Partial derivative with respect to v (central difference).
    pub fn deriv_v(&self, u: f64, v: f64) -> Vec3 {
        let (v_min, v_max) = self.v.domain;
        let dv = (v_max - v_min) * 1e-7;
        let v0 = (v - dv).max(v_min);
        let v1 = (v + dv).min(v_max);
        (self.eval(u, v1) - self.eval(u, v0)) / (v1 - v0)
    }

    /// Sample the surface wireframe.
    ///
    /// Returns `count_u + 1` curves of constant u (each sampled at
    /// `count_v + 1` values of v) followed by `count_v + 1` curves of
    /// constant v. A count of 0 is treated as 1.
    pub fn sample_grid(&self, count_u: usize, count_v: usize) -> Vec<IsoCurve> {
        let count_u = count_u.max(1);
        let count_v = count_v.max(1);
        let us = lattice(self.u.domain, count_u);
        let vs = lattice(self.v.domain, count_v);

        let mut curves = Vec::with_capacity(us.len() + vs.len());
        for &u in &us {
            curves.push(IsoCurve {
                direction: IsoDirection::ConstU,
                parameter: u,
                points: vs.iter().map(|&v| self.eval(u, v)).collect(),
            });
        }
        for &v in &vs {
            curves.push(IsoCurve {
                direction: IsoDirection::ConstV,
                parameter: v,
                points: us.iter().map(|&u| self.eval(u, v)).collect(),
            });
        }
        curves
    }

    /// Estimate curvature along the u and v tangents at `(u, v)`.
    ///
    /// The step is taken in parameter space: [`CURVATURE_STEP`] times the
    /// domain width along each parameter, not a fixed model-space length
    /// along the 3D tangent. The chord between the sample points therefore
    /// scales with the local parametric speed. The second difference of the
    /// three surface points is divided by the squared chord length.
    ///
    /// Only the negated z component is reported, so the estimate is
    /// meaningful for surfaces lying roughly in the xy-plane; a dome gives
    /// positive values. Near the border the stencil is shifted inward.
    /// Returns `None` where a tangent vanishes.
    pub fn surface_curvature(&self, u: f64, v: f64) -> Result<Option<Curvature>> {
        self.check_params(u, v)?;

        let ku = second_difference(self.u.domain, u, self.tol, |t| self.eval(t, v));
        let kv = second_difference(self.v.domain, v, self.tol, |t| self.eval(u, t));

        Ok(match (ku, kv) {
            (Some(ku), Some(kv)) => Some(Curvature { ku, kv }),
            _ => None,
        })
    }
}

fn lattice((lo, hi): (f64, f64), count: usize) -> Vec<f64> {
    (0..=count)
        .map(|i| {
            if i == count {
                hi
            } else {
                lo + (hi - lo) * i as f64 / count as f64
            }
        })
        .collect()
}

fn second_difference<F>((lo, hi): (f64, f64), t: f64, tol: Tolerance, eval: F) -> Option<f64>
where
    F: Fn(f64) -> Point3,
{
    let dt = CURVATURE_STEP * (hi - lo);
    if 2.0 * dt >= hi - lo {
        return None;
    }
    let center = t.clamp(lo + dt, hi - dt);

    let pc = eval(center);
    let pf = eval(center + dt);
    let pb = eval(center - dt);

    let step = (pf - pc).norm();
    if tol.is_zero(step) {
        return None;
    }
    let second = (pf - pc) + (pb - pc);
    Some(-(second / (step * step)).z)
}

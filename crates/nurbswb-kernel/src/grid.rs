//! The editable pole grid.
//!
//! Poles are stored row-major, `index = v * n_u + u`. A *row* is a line of
//! constant `v` (all `u`), a *column* a line of constant `u`.

use std::f64::consts::PI;

use log::debug;
use nurbswb_math::Point3;

use crate::error::{NurbsError, Result};
use crate::pole::{check_weight, WeightedPoint};

/// Smallest pole count along either axis (a degree-1 span).
pub const MIN_POLES: usize = 2;

/// Blend positions are kept this far away from 0 and 1 so the new line
/// never coincides with a neighbour.
const BLEND_EPS: f64 = 1e-5;

/// How a newly inserted pole line is derived from its two neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LineBlend {
    /// Blend x and y only; the new line lies at z = 0 with unit weights.
    Flat,
    /// Blend the full pole: position, height and weight.
    Full,
}

/// Map a dialog height onto a pole z coordinate.
///
/// `z = 100 * tan(0.5 * PI * h / 101)`: nearly linear around 0 and steep
/// toward the ends, so small heights stay fine-grained while large ones
/// still reach far. Only defined for `|h| < 101`.
pub fn eased_height(height: f64) -> Result<f64> {
    if !height.is_finite() || height.abs() >= 101.0 {
        return Err(NurbsError::InvalidHeight(height));
    }
    Ok(100.0 * (0.5 * PI * height / 101.0).tan())
}

/// A 2D array of weighted poles plus the base snapshot used by relative edits.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGrid {
    poles: Vec<WeightedPoint>,
    n_u: usize,
    n_v: usize,
    base: Box<[WeightedPoint]>,
}

impl ControlGrid {
    /// Create a grid from row-major poles.
    pub fn new(poles: Vec<WeightedPoint>, n_u: usize, n_v: usize) -> Result<Self> {
        for n in [n_u, n_v] {
            if n < MIN_POLES {
                return Err(NurbsError::InsufficientPoles {
                    poles: n,
                    degree: MIN_POLES - 1,
                });
            }
        }
        if poles.len() != pole_count(n_u, n_v)? {
            return Err(NurbsError::InvalidPoleArray(format!(
                "{} poles supplied for a {}x{} grid",
                poles.len(),
                n_u,
                n_v
            )));
        }
        for p in &poles {
            check_weight(p.weight)?;
        }
        let base = poles.clone().into_boxed_slice();
        Ok(Self {
            poles,
            n_u,
            n_v,
            base,
        })
    }

    /// Flat generator grid: pole `(u, v)` at `(u * step_u, v * step_v, 0)`.
    pub fn flat(n_u: usize, n_v: usize, step_u: f64, step_v: f64) -> Result<Self> {
        let mut poles = Vec::with_capacity(pole_count(n_u, n_v)?);
        for v in 0..n_v {
            for u in 0..n_u {
                poles.push(WeightedPoint::at(u as f64 * step_u, v as f64 * step_v, 0.0));
            }
        }
        Self::new(poles, n_u, n_v)
    }

    /// Number of poles along u.
    pub fn n_u(&self) -> usize {
        self.n_u
    }

    /// Number of poles along v.
    pub fn n_v(&self) -> usize {
        self.n_v
    }

    /// All poles in row-major order.
    pub fn poles(&self) -> &[WeightedPoint] {
        &self.poles
    }

    /// The base snapshot used by relative height edits.
    pub fn base(&self) -> &[WeightedPoint] {
        &self.base
    }

    /// Replace the base snapshot with a copy of the current poles.
    pub fn commit_base(&mut self) {
        self.base = self.poles.clone().into_boxed_slice();
    }

    /// Whether `(u, v)` addresses a pole.
    pub fn contains(&self, u: usize, v: usize) -> bool {
        u < self.n_u && v < self.n_v
    }

    fn index(&self, u: usize, v: usize) -> Result<usize> {
        if self.contains(u, v) {
            Ok(v * self.n_u + u)
        } else {
            Err(NurbsError::OutOfRange {
                u,
                v,
                n_u: self.n_u,
                n_v: self.n_v,
            })
        }
    }

    /// Get the pole at `(u, v)`.
    pub fn get(&self, u: usize, v: usize) -> Result<WeightedPoint> {
        Ok(self.poles[self.index(u, v)?])
    }

    /// Replace the pole at `(u, v)`.
    pub fn set(&mut self, u: usize, v: usize, pole: WeightedPoint) -> Result<()> {
        check_weight(pole.weight)?;
        let i = self.index(u, v)?;
        self.poles[i] = pole;
        Ok(())
    }

    /// Absolute edit: z from the eased height, plus the pole weight.
    pub fn set_point_height(&mut self, u: usize, v: usize, height: f64, weight: f64) -> Result<()> {
        check_weight(weight)?;
        let z = eased_height(height)?;
        let i = self.index(u, v)?;
        self.poles[i].point.z = z;
        self.poles[i].weight = weight;
        Ok(())
    }

    /// Relative edit: z is the base snapshot's z plus the eased delta.
    ///
    /// With `commit_base` the base snapshot is replaced by the edited grid,
    /// so the next relative edit starts from here.
    pub fn set_point_relative_height(
        &mut self,
        u: usize,
        v: usize,
        delta: f64,
        weight: f64,
        commit_base: bool,
    ) -> Result<()> {
        check_weight(weight)?;
        let dz = eased_height(delta)?;
        let i = self.index(u, v)?;
        self.poles[i].point.z = self.base[i].point.z + dz;
        self.poles[i].weight = weight;
        if commit_base {
            self.commit_base();
        }
        Ok(())
    }

    /// Translate one pole.
    pub fn move_pole(&mut self, u: usize, v: usize, dx: f64, dy: f64, dz: f64) -> Result<()> {
        let i = self.index(u, v)?;
        self.poles[i].point += nurbswb_math::Vec3::new(dx, dy, dz);
        Ok(())
    }

    /// Apply `edit` to every pole in the inclusive rectangle `(u1, v1)..(u2, v2)`.
    ///
    /// Corners may be given in any order. Cells outside the grid are skipped
    /// rather than reported, so a brush overlapping the border still edits
    /// the part that lies inside. Errors returned by `edit` are propagated.
    /// Returns the number of poles visited.
    pub fn apply_to_region<F>(
        &mut self,
        u1: usize,
        v1: usize,
        u2: usize,
        v2: usize,
        mut edit: F,
    ) -> Result<usize>
    where
        F: FnMut(&mut Self, usize, usize) -> Result<()>,
    {
        let (u_lo, u_hi) = (u1.min(u2), u1.max(u2));
        let (v_lo, v_hi) = (v1.min(v2), v1.max(v2));
        let mut count = 0;
        for v in v_lo..=v_hi.min(self.n_v.saturating_sub(1)) {
            for u in u_lo..=u_hi.min(self.n_u.saturating_sub(1)) {
                edit(self, u, v)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Set z of the poles in the rectangle spanning `du` x `dv` poles from `(u, v)`.
    ///
    /// `(u, v)` must address a pole; the far corner is clipped to the grid.
    pub fn elevate_rectangle(
        &mut self,
        u: usize,
        v: usize,
        du: usize,
        dv: usize,
        z: f64,
    ) -> Result<usize> {
        self.index(u, v)?;
        self.apply_to_region(u, v, u.saturating_add(du), v.saturating_add(dv), |g, iu, iv| {
            g.set_z(iu, iv, z);
            Ok(())
        })
    }

    /// Set z of every pole whose xy position lies within `radius` of pole `(u, v)`.
    pub fn elevate_circle(&mut self, u: usize, v: usize, radius: f64, z: f64) -> Result<usize> {
        let center = self.get(u, v)?.point;
        let r2 = radius * radius;
        let mut count = 0;
        for p in self.poles.iter_mut() {
            let dx = p.point.x - center.x;
            let dy = p.point.y - center.y;
            if dx * dx + dy * dy <= r2 {
                p.point.z = z;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Set z of the poles in the index box `[u - r, u + r] x [v - r, v + r]`.
    pub fn elevate_circle_box(&mut self, u: usize, v: usize, radius: usize, z: f64) -> Result<usize> {
        self.index(u, v)?;
        self.elevate_rectangle(
            u.saturating_sub(radius),
            v.saturating_sub(radius),
            u.min(radius).saturating_add(radius),
            v.min(radius).saturating_add(radius),
            z,
        )
    }

    /// Checkerboard of `height` and `depth` over the interior poles.
    pub fn create_waves(&mut self, height: f64, depth: f64) {
        for v in 1..self.n_v - 1 {
            for u in 1..self.n_u - 1 {
                let z = if (u + v) % 2 == 0 { height } else { depth };
                self.set_z(u, v, z);
            }
        }
    }

    /// Set z of the interior poles of row `v` (the end poles stay put).
    pub fn elevate_u_line(&mut self, v: usize, z: f64) -> Result<()> {
        check_line(v, 0, self.n_v - 1)?;
        for u in 1..self.n_u - 1 {
            self.set_z(u, v, z);
        }
        Ok(())
    }

    /// Set z of the interior poles of column `u`.
    pub fn elevate_v_line(&mut self, u: usize, z: f64) -> Result<()> {
        check_line(u, 0, self.n_u - 1)?;
        for v in 1..self.n_v - 1 {
            self.set_z(u, v, z);
        }
        Ok(())
    }

    fn set_z(&mut self, u: usize, v: usize, z: f64) {
        let i = v * self.n_u + u;
        self.poles[i].point.z = z;
    }

    /// Insert a row between rows `after - 1` and `after`.
    ///
    /// `pos` places the new row between its neighbours: 0 at the previous
    /// row, 1 at the next; it is kept strictly inside `(0, 1)`.
    pub fn insert_row(&mut self, after: usize, pos: f64, blend: LineBlend) -> Result<()> {
        let t = clamp_blend(pos);
        self.insert_row_with(after, |_, _| t, blend)
    }

    /// Insert a column between columns `after - 1` and `after`.
    pub fn insert_column(&mut self, after: usize, pos: f64, blend: LineBlend) -> Result<()> {
        let t = clamp_blend(pos);
        self.insert_column_with(after, |_, _| t, blend)
    }

    /// Insert an S-transition row: hard edge, soft blend, hard edge.
    ///
    /// The first 30% of the new row sits on the next row, the part past 60%
    /// on the previous one, and the middle halfway between.
    pub fn insert_s_row(&mut self, after: usize) -> Result<()> {
        self.insert_row_with(after, s_profile, LineBlend::Full)
    }

    /// Insert an S-transition column.
    pub fn insert_s_column(&mut self, after: usize) -> Result<()> {
        self.insert_column_with(after, s_profile, LineBlend::Full)
    }

    fn insert_row_with<F>(&mut self, after: usize, t_at: F, blend: LineBlend) -> Result<()>
    where
        F: Fn(usize, usize) -> f64,
    {
        check_line(after, 1, self.n_v - 1)?;
        let n_u = self.n_u;
        let row: Vec<WeightedPoint> = (0..n_u)
            .map(|u| {
                let prev = &self.poles[(after - 1) * n_u + u];
                let next = &self.poles[after * n_u + u];
                blend_poles(prev, next, t_at(u, n_u), blend)
            })
            .collect();
        let at = after * n_u;
        self.poles.splice(at..at, row);
        self.n_v += 1;
        self.commit_base();
        debug!("inserted row at v={} ({}x{})", after, self.n_u, self.n_v);
        Ok(())
    }

    fn insert_column_with<F>(&mut self, after: usize, t_at: F, blend: LineBlend) -> Result<()>
    where
        F: Fn(usize, usize) -> f64,
    {
        check_line(after, 1, self.n_u - 1)?;
        let (n_u, n_v) = (self.n_u, self.n_v);
        let mut poles = Vec::with_capacity((n_u + 1) * n_v);
        for v in 0..n_v {
            let row = &self.poles[v * n_u..(v + 1) * n_u];
            poles.extend_from_slice(&row[..after]);
            poles.push(blend_poles(&row[after - 1], &row[after], t_at(v, n_v), blend));
            poles.extend_from_slice(&row[after..]);
        }
        self.poles = poles;
        self.n_u += 1;
        self.commit_base();
        debug!("inserted column at u={} ({}x{})", after, self.n_u, self.n_v);
        Ok(())
    }

    /// Remove row `v`.
    pub fn remove_row(&mut self, v: usize) -> Result<()> {
        check_shrink(self.n_v)?;
        check_line(v, 0, self.n_v - 1)?;
        let at = v * self.n_u;
        self.poles.drain(at..at + self.n_u);
        self.n_v -= 1;
        self.commit_base();
        debug!("removed row v={} ({}x{})", v, self.n_u, self.n_v);
        Ok(())
    }

    /// Remove column `u`.
    pub fn remove_column(&mut self, u: usize) -> Result<()> {
        check_shrink(self.n_u)?;
        check_line(u, 0, self.n_u - 1)?;
        let n_u = self.n_u;
        let mut i = 0;
        self.poles.retain(|_| {
            let keep = i % n_u != u;
            i += 1;
            keep
        });
        self.n_u -= 1;
        self.commit_base();
        debug!("removed column u={} ({}x{})", u, self.n_u, self.n_v);
        Ok(())
    }

    /// Straight polylines through the poles: one per row, then one per column.
    pub fn pole_polylines(&self) -> Vec<Vec<Point3>> {
        let mut lines = Vec::with_capacity(self.n_u + self.n_v);
        for v in 0..self.n_v {
            lines.push((0..self.n_u).map(|u| self.poles[v * self.n_u + u].point).collect());
        }
        for u in 0..self.n_u {
            lines.push((0..self.n_v).map(|v| self.poles[v * self.n_u + u].point).collect());
        }
        lines
    }
}

/// `n_u * n_v`, rejecting dimensions whose product does not fit in `usize`.
pub(crate) fn pole_count(n_u: usize, n_v: usize) -> Result<usize> {
    n_u.checked_mul(n_v).ok_or_else(|| {
        NurbsError::InvalidPoleArray(format!("{}x{} grid is too large", n_u, n_v))
    })
}

fn check_line(index: usize, min: usize, max: usize) -> Result<()> {
    if index < min || index > max {
        Err(NurbsError::InvalidIndex { index, min, max })
    } else {
        Ok(())
    }
}

fn check_shrink(n: usize) -> Result<()> {
    if n <= MIN_POLES {
        Err(NurbsError::InsufficientPoles {
            poles: n - 1,
            degree: MIN_POLES - 1,
        })
    } else {
        Ok(())
    }
}

fn clamp_blend(pos: f64) -> f64 {
    pos.clamp(BLEND_EPS, 1.0 - BLEND_EPS)
}

fn s_profile(i: usize, len: usize) -> f64 {
    let f = i as f64;
    let n = len as f64;
    if f > 0.6 * n {
        0.0001
    } else if f < 0.3 * n {
        0.9999
    } else {
        0.5
    }
}

fn blend_poles(prev: &WeightedPoint, next: &WeightedPoint, t: f64, blend: LineBlend) -> WeightedPoint {
    match blend {
        LineBlend::Flat => prev.blend_flat(next, t),
        LineBlend::Full => prev.blend(next, t),
    }
}

//! Surface model and the descriptor handed to B-spline kernels.

use log::{debug, warn};
use nurbswb_math::Point3;
use serde::{Deserialize, Serialize};

use crate::config::{SurfaceConfig, DEFAULT_GRID_COUNT};
use crate::error::{NurbsError, Result};
use crate::grid::{pole_count, ControlGrid};
use crate::knots::{self, check_degree, KnotSpec};
use crate::pole::WeightedPoint;
use crate::presets::{self, ShapeKind};

/// Everything an external B-spline kernel needs to build the surface.
///
/// Poles are row-major (`v * n_u + u`) with Cartesian position and a
/// separate weight. Knots are distinct values with multiplicities; for
/// non-periodic directions the multiplicities sum to `n + degree + 1`
/// (clamped convention), for periodic ones the first and last knot are
/// identified and the multiplicities minus the last sum to `n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDescriptor {
    /// Weighted poles, row-major.
    pub poles: Vec<WeightedPoint>,
    /// Pole count along u.
    pub n_u: usize,
    /// Pole count along v.
    pub n_v: usize,
    /// Degree along u.
    pub degree_u: usize,
    /// Degree along v.
    pub degree_v: usize,
    /// Distinct knot values along u.
    pub knots_u: Vec<f64>,
    /// Multiplicities along u.
    pub mults_u: Vec<usize>,
    /// Distinct knot values along v.
    pub knots_v: Vec<f64>,
    /// Multiplicities along v.
    pub mults_v: Vec<usize>,
    /// Whether u is periodic.
    pub periodic_u: bool,
    /// Whether v is periodic.
    pub periodic_v: bool,
}

impl SurfaceDescriptor {
    /// Pole at `(u, v)`.
    pub fn pole(&self, u: usize, v: usize) -> Option<&WeightedPoint> {
        if u < self.n_u && v < self.n_v {
            self.poles.get(v * self.n_u + u)
        } else {
            None
        }
    }

    /// Knot spec along u.
    pub fn knot_spec_u(&self) -> KnotSpec {
        KnotSpec {
            degree: self.degree_u,
            knots: self.knots_u.clone(),
            mults: self.mults_u.clone(),
        }
    }

    /// Knot spec along v.
    pub fn knot_spec_v(&self) -> KnotSpec {
        KnotSpec {
            degree: self.degree_v,
            knots: self.knots_v.clone(),
            mults: self.mults_v.clone(),
        }
    }

    /// Whether any weight differs from 1.
    pub fn is_rational(&self) -> bool {
        self.poles.iter().any(|p| (p.weight - 1.0).abs() > 1e-12)
    }

    /// Check the structural consistency of the descriptor.
    pub fn validate(&self) -> Result<()> {
        if self.poles.len() != pole_count(self.n_u, self.n_v)? {
            return Err(NurbsError::InvalidPoleArray(format!(
                "{} poles for a {}x{} grid",
                self.poles.len(),
                self.n_u,
                self.n_v
            )));
        }
        for p in &self.poles {
            crate::pole::check_weight(p.weight)?;
        }
        validate_direction("u", &self.knot_spec_u(), self.n_u, self.periodic_u)?;
        validate_direction("v", &self.knot_spec_v(), self.n_v, self.periodic_v)
    }
}

fn validate_direction(axis: &str, spec: &KnotSpec, n: usize, periodic: bool) -> Result<()> {
    check_degree(spec.degree)?;
    if n < spec.degree + 1 {
        return Err(NurbsError::InsufficientPoles {
            poles: n,
            degree: spec.degree,
        });
    }
    if spec.knots.len() != spec.mults.len() || spec.knots.len() < 2 {
        return Err(NurbsError::InvalidPoleArray(format!(
            "{} knots with {} multiplicities along {}",
            spec.knots.len(),
            spec.mults.len(),
            axis
        )));
    }
    if spec.knots.windows(2).any(|w| w[0] >= w[1]) {
        return Err(NurbsError::InvalidPoleArray(format!(
            "knots along {} are not strictly increasing",
            axis
        )));
    }
    let total = spec.total_multiplicity();
    let expected = if periodic {
        n + spec.mults[spec.mults.len() - 1]
    } else {
        n + spec.degree + 1
    };
    if total != expected {
        return Err(NurbsError::InvalidPoleArray(format!(
            "multiplicities along {} sum to {}, expected {}",
            axis, total, expected
        )));
    }
    Ok(())
}

/// A pole grid plus the degrees and shape needed to turn it into a surface.
#[derive(Debug, Clone)]
pub struct SurfaceModel {
    grid: ControlGrid,
    degree_u: usize,
    degree_v: usize,
    shape: ShapeKind,
    grid_count: usize,
    /// Whether the host should close the surface into a solid.
    pub solid: bool,
}

impl SurfaceModel {
    /// Create a free-form model.
    pub fn new(grid: ControlGrid, degree_u: usize, degree_v: usize) -> Result<Self> {
        check_degree(degree_u)?;
        check_degree(degree_v)?;
        Ok(Self {
            grid,
            degree_u,
            degree_v,
            shape: ShapeKind::Free,
            grid_count: DEFAULT_GRID_COUNT,
            solid: false,
        })
    }

    /// Create a model from configuration: a flat generator grid and the
    /// configured shape.
    pub fn from_config(config: &SurfaceConfig) -> Result<Self> {
        config.validate()?;
        let grid = ControlGrid::flat(config.n_u, config.n_v, config.step_u, config.step_v)?;
        let mut model = Self::new(grid, config.degree_u, config.degree_v)?;
        model.shape = config.shape;
        model.grid_count = config.grid_count;
        model.solid = config.solid;
        Ok(model)
    }

    /// Builder-style shape selection.
    pub fn with_shape(mut self, shape: ShapeKind) -> Self {
        self.shape = shape;
        self
    }

    /// The pole grid.
    pub fn grid(&self) -> &ControlGrid {
        &self.grid
    }

    /// Mutable access to the pole grid.
    pub fn grid_mut(&mut self) -> &mut ControlGrid {
        &mut self.grid
    }

    /// Shape generator in use.
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Select the shape generator.
    pub fn set_shape(&mut self, shape: ShapeKind) {
        self.shape = shape;
    }

    /// Isoparametric curves per direction in the preview wireframe.
    pub fn grid_count(&self) -> usize {
        self.grid_count
    }

    /// Change the preview wireframe resolution.
    pub fn set_grid_count(&mut self, count: usize) {
        self.grid_count = count;
    }

    /// Whether the surface wraps around in u.
    pub fn closed_u(&self) -> bool {
        self.shape.is_closed_u()
    }

    /// Requested degrees `(u, v)`.
    pub fn degrees(&self) -> (usize, usize) {
        (self.degree_u, self.degree_v)
    }

    /// Change the requested degrees.
    pub fn set_degrees(&mut self, degree_u: usize, degree_v: usize) -> Result<()> {
        check_degree(degree_u)?;
        check_degree(degree_v)?;
        self.degree_u = degree_u;
        self.degree_v = degree_v;
        Ok(())
    }

    /// Degrees actually used: requested degrees clamped to `n - 1`.
    pub fn effective_degrees(&self) -> (usize, usize) {
        (
            effective_degree(self.degree_u, self.grid.n_u(), "u"),
            effective_degree(self.degree_v, self.grid.n_v(), "v"),
        )
    }

    /// Knot spec along u for the current grid.
    pub fn knot_spec_u(&self) -> Result<KnotSpec> {
        let (du, _) = self.effective_degrees();
        KnotSpec::clamped(self.grid.n_u(), du)
    }

    /// Knot spec along v for the current grid.
    pub fn knot_spec_v(&self) -> Result<KnotSpec> {
        let (_, dv) = self.effective_degrees();
        KnotSpec::clamped(self.grid.n_v(), dv)
    }

    /// Build the surface descriptor from the current grid.
    ///
    /// `pole_coordinates` replaces the grid positions (weights still come
    /// from the grid); it must hold one point per pole. The positions are
    /// then passed through the shape generator. The torus preset ignores
    /// both and returns its fixed control mesh.
    pub fn build(&self, pole_coordinates: Option<&[Point3]>) -> Result<SurfaceDescriptor> {
        if self.shape == ShapeKind::Torus {
            return Ok(torus_descriptor());
        }

        let n_u = self.grid.n_u();
        let n_v = self.grid.n_v();
        let source: Vec<Point3> = match pole_coordinates {
            Some(coords) if coords.len() != n_u * n_v => {
                return Err(NurbsError::InvalidPoleArray(format!(
                    "{} coordinates supplied for a {}x{} grid",
                    coords.len(),
                    n_u,
                    n_v
                )))
            }
            Some(coords) => coords.to_vec(),
            None => self.grid.poles().iter().map(|p| p.point).collect(),
        };

        let mapped = match self.shape {
            ShapeKind::Cylinder => presets::cylinder_coords(&source)?,
            ShapeKind::Sphere => presets::sphere_coords(&source)?,
            _ => source,
        };

        let poles = mapped
            .into_iter()
            .zip(self.grid.poles())
            .map(|(point, pole)| WeightedPoint::new(point, pole.weight))
            .collect();

        let (du, dv) = self.effective_degrees();
        let (knots_u, mults_u) = knots::build(n_u, du)?;
        let (knots_v, mults_v) = knots::build(n_v, dv)?;

        debug!(
            "built {:?} surface {}x{} degree ({}, {}), {} u knots, {} v knots",
            self.shape,
            n_u,
            n_v,
            du,
            dv,
            knots_u.len(),
            knots_v.len()
        );

        Ok(SurfaceDescriptor {
            poles,
            n_u,
            n_v,
            degree_u: du,
            degree_v: dv,
            knots_u,
            mults_u,
            knots_v,
            mults_v,
            periodic_u: false,
            periodic_v: false,
        })
    }
}

fn effective_degree(requested: usize, poles: usize, axis: &str) -> usize {
    let max = poles.saturating_sub(1).max(1);
    if requested > max {
        warn!(
            "degree {} along {} needs {} poles, only {} present: using degree {}",
            requested,
            axis,
            requested + 1,
            poles,
            max
        );
        max
    } else {
        requested
    }
}

fn torus_descriptor() -> SurfaceDescriptor {
    let t = presets::torus();
    debug!("built torus preset {}x{}", t.n_u, t.n_v);
    SurfaceDescriptor {
        poles: t.poles,
        n_u: t.n_u,
        n_v: t.n_v,
        degree_u: t.knots_u.degree,
        degree_v: t.knots_v.degree,
        knots_u: t.knots_u.knots,
        mults_u: t.knots_u.mults,
        knots_v: t.knots_v.knots,
        mults_v: t.knots_v.mults,
        periodic_u: true,
        periodic_v: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::SurfaceEvaluator;
    use nurbswb_math::radial_distance;

    fn flat_model(n_u: usize, n_v: usize, du: usize, dv: usize) -> SurfaceModel {
        SurfaceModel::new(ControlGrid::flat(n_u, n_v, 100.0, 100.0).unwrap(), du, dv).unwrap()
    }

    #[test]
    fn test_from_config() {
        let config = SurfaceConfig::from_toml_str(
            r#"
            n_u = 6
            n_v = 3
            degree_v = 2
            shape = "cylinder"
            grid_count = 3
            solid = true
            "#,
        )
        .unwrap();
        let model = SurfaceModel::from_config(&config).unwrap();
        assert_eq!((model.grid().n_u(), model.grid().n_v()), (6, 3));
        assert_eq!(model.degrees(), (3, 2));
        assert_eq!(model.shape(), ShapeKind::Cylinder);
        assert_eq!(model.grid_count(), 3);
        assert!(model.solid);
        assert_eq!(flat_model(3, 3, 2, 2).grid_count(), DEFAULT_GRID_COUNT);
    }

    #[test]
    fn test_build_free() {
        let model = flat_model(5, 4, 3, 2);
        let d = model.build(None).unwrap();
        assert_eq!((d.n_u, d.n_v), (5, 4));
        assert_eq!((d.degree_u, d.degree_v), (3, 2));
        assert_eq!(d.mults_u.iter().sum::<usize>(), 5 + 3 + 1);
        assert_eq!(d.mults_v.iter().sum::<usize>(), 4 + 2 + 1);
        assert!(!d.periodic_u && !d.periodic_v);
        assert_eq!(d.pole(4, 3).unwrap().point, Point3::new(400.0, 300.0, 0.0));
        assert!(d.validate().is_ok());
        assert!(!d.is_rational());
    }

    #[test]
    fn test_build_carries_weights() {
        let mut model = flat_model(3, 3, 2, 2);
        model.grid_mut().set_point_height(1, 1, 0.0, 4.0).unwrap();
        let d = model.build(None).unwrap();
        assert_eq!(d.pole(1, 1).unwrap().weight, 4.0);
        assert!(d.is_rational());
    }

    #[test]
    fn test_build_with_explicit_coordinates() {
        let model = flat_model(2, 2, 1, 1);
        let coords = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(0.0, 1.0, 3.0),
            Point3::new(1.0, 1.0, 4.0),
        ];
        let d = model.build(Some(&coords)).unwrap();
        assert_eq!(d.pole(1, 1).unwrap().point.z, 4.0);
        assert!(model.build(Some(&coords[..3])).is_err());
    }

    #[test]
    fn test_degree_clamped_to_pole_count() {
        let model = flat_model(3, 2, 3, 3);
        assert_eq!(model.effective_degrees(), (2, 1));
        let d = model.build(None).unwrap();
        assert_eq!((d.degree_u, d.degree_v), (2, 1));
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_invalid_degrees() {
        let grid = ControlGrid::flat(5, 5, 1.0, 1.0).unwrap();
        assert!(matches!(
            SurfaceModel::new(grid, 4, 3),
            Err(NurbsError::InvalidDegree(4))
        ));
        let mut model = flat_model(5, 5, 3, 3);
        assert!(model.set_degrees(2, 0).is_err());
        assert_eq!(model.degrees(), (3, 3));
        model.set_degrees(1, 2).unwrap();
        assert_eq!(model.degrees(), (1, 2));
    }

    #[test]
    fn test_knots_follow_resize() {
        let mut model = flat_model(4, 4, 3, 3);
        let before = model.knot_spec_u().unwrap();
        model
            .grid_mut()
            .insert_column(2, 0.5, crate::grid::LineBlend::Flat)
            .unwrap();
        let after = model.knot_spec_u().unwrap();
        assert_eq!(before.total_multiplicity() + 1, after.total_multiplicity());
    }

    #[test]
    fn test_build_cylinder() {
        let model = flat_model(6, 4, 3, 3).with_shape(ShapeKind::Cylinder);
        assert!(model.closed_u());
        let d = model.build(None).unwrap();
        for p in &d.poles {
            assert!((radial_distance(&p.point) - 400.0).abs() < 1e-9);
        }
        assert!(!d.periodic_u);
        // seam: first and last column coincide
        let a = d.pole(0, 2).unwrap().point;
        let b = d.pole(5, 2).unwrap().point;
        assert!((a - b).norm() < 1e-9);
    }

    #[test]
    fn test_build_sphere_degenerate() {
        let grid = ControlGrid::new(vec![WeightedPoint::at(1.0, 1.0, 0.0); 4], 2, 2).unwrap();
        let model = SurfaceModel::new(grid, 1, 1)
            .unwrap()
            .with_shape(ShapeKind::Sphere);
        assert!(matches!(
            model.build(None),
            Err(NurbsError::DegenerateGrid { .. })
        ));
    }

    #[test]
    fn test_build_torus() {
        let model = flat_model(5, 5, 3, 3).with_shape(ShapeKind::Torus);
        let d = model.build(None).unwrap();
        assert_eq!((d.n_u, d.n_v), (7, 4));
        assert!(d.periodic_u && d.periodic_v);
        assert_eq!(d.mults_u, vec![2, 1, 1, 1, 1, 1, 2]);
        assert_eq!(d.knots_v, vec![0.0, 0.4, 0.6, 1.0]);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_knots() {
        let model = flat_model(4, 4, 3, 3);
        let mut d = model.build(None).unwrap();
        d.mults_u[0] = 3;
        assert!(d.validate().is_err());
        let mut d = model.build(None).unwrap();
        d.knots_v = vec![0.0, 0.0, 1.0];
        d.mults_v = vec![4, 0, 4];
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_dimensions() {
        let mut d = flat_model(3, 3, 2, 2).build(None).unwrap();
        d.n_u = usize::MAX / 2;
        d.n_v = 4;
        assert!(matches!(d.validate(), Err(NurbsError::InvalidPoleArray(_))));
        assert!(SurfaceEvaluator::new(&d).is_err());
    }

    #[test]
    fn test_descriptor_json() {
        let d = flat_model(2, 2, 1, 1).build(None).unwrap();
        let json = serde_json::to_string(&d).unwrap();
        let back: SurfaceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}

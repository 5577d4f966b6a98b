#![warn(missing_docs)]

//! Pole-grid NURBS surfaces.
//!
//! A [`ControlGrid`] holds a rectangular array of weighted poles that can be
//! edited point by point, by region, or by inserting and removing whole pole
//! lines. A [`SurfaceModel`] pairs the grid with degrees and a shape
//! generator and builds a [`SurfaceDescriptor`]: poles, clamped knot
//! vectors and multiplicities ready for any B-spline kernel. The bundled
//! [`SurfaceEvaluator`] evaluates descriptors directly, for previews and
//! curvature queries.
//!
//! # Example
//!
//! ```
//! use nurbswb_kernel::{ControlGrid, SurfaceEvaluator, SurfaceModel};
//!
//! let mut grid = ControlGrid::flat(5, 5, 100.0, 100.0)?;
//! grid.set_point_height(2, 2, 50.0, 1.0)?;
//!
//! let model = SurfaceModel::new(grid, 3, 3)?;
//! let surface = SurfaceEvaluator::new(&model.build(None)?)?;
//! let top = surface.evaluate(0.5, 0.5)?;
//! assert!(top.z > 0.0);
//! # Ok::<(), nurbswb_kernel::NurbsError>(())
//! ```

pub mod config;
pub mod error;
pub mod evaluate;
pub mod grid;
pub mod knots;
pub mod model;
pub mod pole;
pub mod presets;
pub mod serial;

pub use config::{SurfaceConfig, DEFAULT_GRID_COUNT};
pub use error::{NurbsError, Result};
pub use evaluate::{Curvature, IsoCurve, IsoDirection, SurfaceEvaluator};
pub use grid::{eased_height, ControlGrid, LineBlend};
pub use knots::{KnotSpec, MAX_DEGREE};
pub use model::{SurfaceDescriptor, SurfaceModel};
pub use pole::WeightedPoint;
pub use presets::{ShapeKind, TorusPreset};
pub use serial::PoleArray;

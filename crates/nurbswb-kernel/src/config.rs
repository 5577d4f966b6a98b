//! Surface configuration loaded from TOML.
//!
//! ```toml
//! n_u = 7
//! n_v = 5
//! degree_u = 3
//! degree_v = 2
//! shape = "cylinder"
//! grid_count = 10
//! ```
//!
//! Missing keys take the values of [`SurfaceConfig::default`].

use serde::{Deserialize, Serialize};

use crate::error::{NurbsError, Result};
use crate::grid::MIN_POLES;
use crate::knots::check_degree;
use crate::presets::ShapeKind;

/// Isoparametric curves per direction in the preview wireframe, unless configured.
pub const DEFAULT_GRID_COUNT: usize = 6;

/// Parameters for a freshly generated surface and its preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Pole count along u.
    pub n_u: usize,
    /// Pole count along v.
    pub n_v: usize,
    /// Requested degree along u.
    pub degree_u: usize,
    /// Requested degree along v.
    pub degree_v: usize,
    /// Pole spacing along u for the flat generator grid.
    pub step_u: f64,
    /// Pole spacing along v for the flat generator grid.
    pub step_v: f64,
    /// Shape generator.
    pub shape: ShapeKind,
    /// Isoparametric curve count per direction in the preview wireframe.
    pub grid_count: usize,
    /// Whether the host should close the surface into a solid.
    pub solid: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            n_u: 5,
            n_v: 5,
            degree_u: 3,
            degree_v: 3,
            step_u: 100.0,
            step_v: 100.0,
            shape: ShapeKind::Free,
            grid_count: DEFAULT_GRID_COUNT,
            solid: false,
        }
    }
}

impl SurfaceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check pole counts, degrees and spacing.
    pub fn validate(&self) -> Result<()> {
        check_degree(self.degree_u)?;
        check_degree(self.degree_v)?;
        for n in [self.n_u, self.n_v] {
            if n < MIN_POLES {
                return Err(NurbsError::InsufficientPoles {
                    poles: n,
                    degree: MIN_POLES - 1,
                });
            }
        }
        for (step, axis) in [(self.step_u, "x"), (self.step_v, "y")] {
            if !step.is_finite() || step <= 0.0 {
                return Err(NurbsError::DegenerateGrid { axis });
            }
        }
        Ok(())
    }
}

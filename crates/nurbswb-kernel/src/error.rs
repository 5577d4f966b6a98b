//! Error types for the surface kernel.

use thiserror::Error;

/// Errors raised by grid edits, surface building and evaluation.
///
/// All of these are local validation failures. Nothing in the kernel
/// performs I/O, so no variant is transient.
#[derive(Error, Debug)]
pub enum NurbsError {
    /// Degree outside `1..=3`.
    #[error("invalid degree {0}: supported degrees are 1, 2 and 3")]
    InvalidDegree(usize),

    /// Not enough poles along one axis for the requested degree.
    #[error("{poles} poles cannot carry degree {degree}: at least {} required", .degree + 1)]
    InsufficientPoles {
        /// Pole count along the axis.
        poles: usize,
        /// Requested degree.
        degree: usize,
    },

    /// Pole index outside the grid.
    #[error("pole ({u}, {v}) is outside the {n_u}x{n_v} grid")]
    OutOfRange {
        /// Requested u index.
        u: usize,
        /// Requested v index.
        v: usize,
        /// Grid size along u.
        n_u: usize,
        /// Grid size along v.
        n_v: usize,
    },

    /// Line index not valid for an insert or remove operation.
    #[error("invalid line index {index}: expected a value in [{min}, {max}]")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Smallest accepted index.
        min: usize,
        /// Largest accepted index.
        max: usize,
    },

    /// Shape normalization hit a zero coordinate range.
    #[error("degenerate pole grid: all {axis} coordinates are identical")]
    DegenerateGrid {
        /// Axis name (`"x"` or `"y"`).
        axis: &'static str,
    },

    /// Surface parameter outside the evaluation domain.
    #[error("parameter ({u}, {v}) outside the surface domain")]
    ParameterOutOfRange {
        /// Requested u parameter.
        u: f64,
        /// Requested v parameter.
        v: f64,
    },

    /// Pole weight that is not strictly positive and finite.
    #[error("invalid weight {0}: weights must be finite and > 0")]
    InvalidWeight(f64),

    /// Height outside the open interval where the easing curve is defined.
    #[error("invalid height {0}: heights must lie strictly between -101 and 101")]
    InvalidHeight(f64),

    /// Serialized pole data that does not describe a grid.
    #[error("invalid pole array: {0}")]
    InvalidPoleArray(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, NurbsError>;

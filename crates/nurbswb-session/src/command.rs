//! Commands accepted by an [`EditSession`](crate::EditSession).
//!
//! Commands are plain data so a GUI, a script or a replay log can drive a
//! session the same way. They serialize as JSON objects tagged by `type`:
//!
//! ```json
//! {"type": "ApplyEdit", "height": 50.0, "weight": 1.0}
//! ```

use serde::{Deserialize, Serialize};

/// How [`Command::ApplyEdit`] interprets its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditMode {
    /// Height replaces the pole z.
    #[default]
    Absolute,
    /// Height is added to the z of the base snapshot.
    Relative,
}

/// One session command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Set the first selection corner. In single-selection mode this sets both.
    SelectPole1 {
        /// Pole index along u.
        u: usize,
        /// Pole index along v.
        v: usize,
    },
    /// Set the second selection corner.
    SelectPole2 {
        /// Pole index along u.
        u: usize,
        /// Pole index along v.
        v: usize,
    },
    /// Tie both selection corners together.
    SetSingleSelection {
        /// Whether single-selection mode is on.
        enabled: bool,
    },
    /// Switch between absolute and relative edits.
    SetMode {
        /// New mode.
        mode: EditMode,
    },
    /// Edit every selected pole with the current mode.
    ApplyEdit {
        /// Dialog height, eased onto z.
        height: f64,
        /// New pole weight.
        weight: f64,
    },
    /// Insert a row before row `after`.
    InsertRow {
        /// Index of the row that follows the new one.
        after: usize,
        /// Position between the neighbours, 0..1.
        pos: f64,
    },
    /// Insert a column before column `after`.
    InsertColumn {
        /// Index of the column that follows the new one.
        after: usize,
        /// Position between the neighbours, 0..1.
        pos: f64,
    },
    /// Insert an S-transition row before row `after`.
    InsertSRow {
        /// Index of the row that follows the new one.
        after: usize,
    },
    /// Insert an S-transition column before column `after`.
    InsertSColumn {
        /// Index of the column that follows the new one.
        after: usize,
    },
    /// Remove row `v`.
    RemoveRow {
        /// Row index.
        v: usize,
    },
    /// Remove column `u`.
    RemoveColumn {
        /// Column index.
        u: usize,
    },
    /// Make the current poles the base for relative edits.
    CommitRelativeBaseline,
    /// Set z over a `du` x `dv` block of poles starting at `(u, v)`.
    ElevateRectangle {
        /// Start index along u.
        u: usize,
        /// Start index along v.
        v: usize,
        /// Extent along u.
        du: usize,
        /// Extent along v.
        dv: usize,
        /// New z.
        z: f64,
    },
    /// Set z of every pole within `radius` (model units, xy) of pole `(u, v)`.
    ElevateCircle {
        /// Center index along u.
        u: usize,
        /// Center index along v.
        v: usize,
        /// Radius in model units.
        radius: f64,
        /// New z.
        z: f64,
    },
    /// Set z over the index box `radius` poles around `(u, v)`.
    ElevateCircleBox {
        /// Center index along u.
        u: usize,
        /// Center index along v.
        v: usize,
        /// Half-width in poles.
        radius: usize,
        /// New z.
        z: f64,
    },
    /// Checkerboard of two heights over the interior poles.
    CreateWaves {
        /// z of the even cells.
        height: f64,
        /// z of the odd cells.
        depth: f64,
    },
    /// Set z of the interior poles of row `v`.
    ElevateULine {
        /// Row index.
        v: usize,
        /// New z.
        z: f64,
    },
    /// Set z of the interior poles of column `u`.
    ElevateVLine {
        /// Column index.
        u: usize,
        /// New z.
        z: f64,
    },
    /// Translate one pole.
    MovePole {
        /// Index along u.
        u: usize,
        /// Index along v.
        v: usize,
        /// Offset along x.
        dx: f64,
        /// Offset along y.
        dy: f64,
        /// Offset along z.
        dz: f64,
    },
    /// Change the requested surface degrees.
    SetDegrees {
        /// Degree along u.
        degree_u: usize,
        /// Degree along v.
        degree_v: usize,
    },
    /// Read back the first selected pole.
    Inspect,
}

impl Command {
    /// Whether the command changes the surface and so triggers a rebuild.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::SelectPole1 { .. }
                | Command::SelectPole2 { .. }
                | Command::SetSingleSelection { .. }
                | Command::SetMode { .. }
                | Command::CommitRelativeBaseline
                | Command::Inspect
        )
    }
}

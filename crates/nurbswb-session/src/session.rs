//! The edit session state machine.

use log::debug;
use nurbswb_kernel::{
    IsoCurve, LineBlend, SurfaceDescriptor, SurfaceEvaluator, SurfaceModel, WeightedPoint,
};

use crate::command::{Command, EditMode};
use crate::error::{Result, SessionError};
use crate::sink::{GeometrySink, NullSink};

/// Where the session is in its command cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing selected.
    Idle,
    /// A selection exists; edits will apply to it.
    Selecting,
    /// An edit is being applied and the surface rebuilt.
    Editing,
}

/// Inclusive selection rectangle with `u1 <= u2` and `v1 <= v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Low u index.
    pub u1: usize,
    /// Low v index.
    pub v1: usize,
    /// High u index.
    pub u2: usize,
    /// High v index.
    pub v2: usize,
}

impl Selection {
    /// Rectangle spanned by two corners given in any order.
    pub fn from_corners((ua, va): (usize, usize), (ub, vb): (usize, usize)) -> Self {
        Self {
            u1: ua.min(ub),
            v1: va.min(vb),
            u2: ua.max(ub),
            v2: va.max(vb),
        }
    }

    /// Whether `(u, v)` lies inside.
    pub fn contains(&self, u: usize, v: usize) -> bool {
        (self.u1..=self.u2).contains(&u) && (self.v1..=self.v2).contains(&v)
    }
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Session state changed, the surface did not.
    Unchanged,
    /// The surface was edited and rebuilt.
    Rebuilt {
        /// Poles touched by the edit.
        poles_edited: usize,
    },
    /// Readout of one pole.
    Pole(PoleReading),
}

/// Current z and weight of one pole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoleReading {
    /// Index along u.
    pub u: usize,
    /// Index along v.
    pub v: usize,
    /// Pole z (already eased).
    pub z: f64,
    /// Pole weight.
    pub weight: f64,
}

/// Geometry derived by the latest rebuild.
#[derive(Debug, Clone)]
pub struct Refresh {
    /// Descriptor handed to the sink.
    pub descriptor: SurfaceDescriptor,
    /// Sampled surface wireframe.
    pub wireframe: Vec<IsoCurve>,
}

/// Interactive editing of one surface model.
///
/// The session borrows its model for its whole lifetime; independent
/// surfaces get independent sessions. Every mutating command runs the edit,
/// rebuilds the surface and notifies the sink before returning. A command
/// that fails leaves the model as it was.
pub struct EditSession<'m, S: GeometrySink = NullSink> {
    model: &'m mut SurfaceModel,
    sink: S,
    state: SessionState,
    mode: EditMode,
    single: bool,
    pole1: Option<(usize, usize)>,
    pole2: Option<(usize, usize)>,
    grid_count: usize,
    last: Option<Refresh>,
}

impl<'m> EditSession<'m, NullSink> {
    /// Session without a geometry consumer.
    pub fn new(model: &'m mut SurfaceModel) -> Self {
        Self::with_sink(model, NullSink)
    }
}

impl<'m, S: GeometrySink> EditSession<'m, S> {
    /// Session reporting to `sink`.
    pub fn with_sink(model: &'m mut SurfaceModel, sink: S) -> Self {
        let grid_count = model.grid_count();
        Self {
            model,
            sink,
            state: SessionState::Idle,
            mode: EditMode::Absolute,
            single: false,
            pole1: None,
            pole2: None,
            grid_count,
            last: None,
        }
    }

    /// Builder-style wireframe resolution, overriding the model's.
    pub fn with_grid_count(mut self, count: usize) -> Self {
        self.grid_count = count;
        self
    }

    /// The model being edited.
    pub fn model(&self) -> &SurfaceModel {
        self.model
    }

    /// The geometry sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current edit mode.
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Normalized selection rectangle, if any corner is set.
    pub fn selection(&self) -> Option<Selection> {
        let a = self.pole1.or(self.pole2)?;
        let b = self.pole2.unwrap_or(a);
        Some(Selection::from_corners(a, b))
    }

    /// Poles inside the selection rectangle, row-major. Cells that fell
    /// outside the grid after a resize are left out.
    pub fn selected_poles(&self) -> Vec<WeightedPoint> {
        let Some(sel) = self.selection() else {
            return Vec::new();
        };
        let grid = self.model.grid();
        let mut poles = Vec::new();
        for v in sel.v1..=sel.v2 {
            for u in sel.u1..=sel.u2 {
                if let Ok(p) = grid.get(u, v) {
                    poles.push(p);
                }
            }
        }
        poles
    }

    /// Geometry from the latest rebuild.
    pub fn last_refresh(&self) -> Option<&Refresh> {
        self.last.as_ref()
    }

    /// Rebuild the surface without editing it.
    pub fn refresh(&mut self) -> Result<()> {
        self.rebuild()
    }

    /// Execute one command.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        debug!("session command {:?}", command);
        if !command.mutates() {
            return self.update_state(command);
        }

        let backup = self.model.clone();
        self.state = SessionState::Editing;
        let result = self.edit(command).and_then(|count| {
            self.rebuild()?;
            Ok(count)
        });
        self.state = if self.selection().is_some() {
            SessionState::Selecting
        } else {
            SessionState::Idle
        };

        match result {
            Ok(poles_edited) => Ok(Outcome::Rebuilt { poles_edited }),
            Err(e) => {
                *self.model = backup;
                Err(e)
            }
        }
    }

    fn update_state(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::SelectPole1 { u, v } => {
                self.check_pole(u, v)?;
                self.pole1 = Some((u, v));
                if self.single {
                    self.pole2 = Some((u, v));
                }
                self.selection_updated();
            }
            Command::SelectPole2 { u, v } => {
                self.check_pole(u, v)?;
                self.pole2 = Some((u, v));
                if self.single {
                    self.pole1 = Some((u, v));
                }
                self.selection_updated();
            }
            Command::SetSingleSelection { enabled } => {
                self.single = enabled;
                if enabled && self.selection().is_some() {
                    self.pole2 = self.pole1.or(self.pole2);
                    self.pole1 = self.pole2;
                    self.selection_updated();
                }
            }
            Command::SetMode { mode } => {
                if mode == EditMode::Relative && self.mode != EditMode::Relative {
                    self.model.grid_mut().commit_base();
                }
                self.mode = mode;
            }
            Command::CommitRelativeBaseline => self.model.grid_mut().commit_base(),
            Command::Inspect => {
                let (u, v) = self.pole1.or(self.pole2).ok_or(SessionError::NoSelection)?;
                let p = self.model.grid().get(u, v)?;
                return Ok(Outcome::Pole(PoleReading {
                    u,
                    v,
                    z: p.point.z,
                    weight: p.weight,
                }));
            }
            _ => unreachable!("mutating command routed to update_state"),
        }
        Ok(Outcome::Unchanged)
    }

    /// Apply a mutating command to the grid; returns the poles touched.
    fn edit(&mut self, command: Command) -> Result<usize> {
        match command {
            Command::ApplyEdit { height, weight } => {
                let sel = self.selection().ok_or(SessionError::NoSelection)?;
                let mode = self.mode;
                let count = self.model.grid_mut().apply_to_region(
                    sel.u1,
                    sel.v1,
                    sel.u2,
                    sel.v2,
                    |g, u, v| match mode {
                        EditMode::Absolute => g.set_point_height(u, v, height, weight),
                        EditMode::Relative => {
                            g.set_point_relative_height(u, v, height, weight, false)
                        }
                    },
                )?;
                return Ok(count);
            }
            Command::SetDegrees { degree_u, degree_v } => {
                self.model.set_degrees(degree_u, degree_v)?;
                return Ok(0);
            }
            _ => {}
        }

        let grid = self.model.grid_mut();
        let count = match command {
            Command::InsertRow { after, pos } => {
                grid.insert_row(after, pos, LineBlend::Flat)?;
                grid.n_u()
            }
            Command::InsertColumn { after, pos } => {
                grid.insert_column(after, pos, LineBlend::Flat)?;
                grid.n_v()
            }
            Command::InsertSRow { after } => {
                grid.insert_s_row(after)?;
                grid.n_u()
            }
            Command::InsertSColumn { after } => {
                grid.insert_s_column(after)?;
                grid.n_v()
            }
            Command::RemoveRow { v } => {
                grid.remove_row(v)?;
                grid.n_u()
            }
            Command::RemoveColumn { u } => {
                grid.remove_column(u)?;
                grid.n_v()
            }
            Command::ElevateRectangle { u, v, du, dv, z } => {
                grid.elevate_rectangle(u, v, du, dv, z)?
            }
            Command::ElevateCircle { u, v, radius, z } => grid.elevate_circle(u, v, radius, z)?,
            Command::ElevateCircleBox { u, v, radius, z } => {
                grid.elevate_circle_box(u, v, radius, z)?
            }
            Command::CreateWaves { height, depth } => {
                grid.create_waves(height, depth);
                (grid.n_u() - 2) * (grid.n_v() - 2)
            }
            Command::ElevateULine { v, z } => {
                grid.elevate_u_line(v, z)?;
                grid.n_u() - 2
            }
            Command::ElevateVLine { u, z } => {
                grid.elevate_v_line(u, z)?;
                grid.n_v() - 2
            }
            Command::MovePole { u, v, dx, dy, dz } => {
                grid.move_pole(u, v, dx, dy, dz)?;
                1
            }
            _ => unreachable!("non-mutating command routed to edit"),
        };
        Ok(count)
    }

    fn rebuild(&mut self) -> Result<()> {
        let descriptor = self.model.build(None)?;
        let evaluator = SurfaceEvaluator::new(&descriptor)?;
        let wireframe = evaluator.sample_grid(self.grid_count, self.grid_count);

        self.sink.surface_rebuilt(&descriptor, &wireframe);
        self.sink.poles_changed(&self.model.grid().pole_polylines());
        let selected = self.selected_poles();
        if !selected.is_empty() {
            self.sink.selection_changed(&selected);
        }

        self.last = Some(Refresh {
            descriptor,
            wireframe,
        });
        Ok(())
    }

    fn check_pole(&self, u: usize, v: usize) -> Result<()> {
        self.model.grid().get(u, v)?;
        Ok(())
    }

    fn selection_updated(&mut self) {
        self.state = SessionState::Selecting;
        let selected = self.selected_poles();
        self.sink.selection_changed(&selected);
    }
}

#![warn(missing_docs)]

//! Interactive editing of pole-grid NURBS surfaces.
//!
//! An [`EditSession`] borrows one [`SurfaceModel`](nurbswb_kernel::SurfaceModel)
//! and executes [`Command`]s against it: pole selection, height edits over
//! the selected rectangle, row and column insertion and the region
//! elevation tools. Each mutating command rebuilds the surface and pushes
//! the result to a [`GeometrySink`].
//!
//! # Example
//!
//! ```
//! use nurbswb_kernel::{SurfaceConfig, SurfaceModel};
//! use nurbswb_session::{Command, EditSession};
//!
//! let mut model = SurfaceModel::from_config(&SurfaceConfig::default())?;
//! let mut session = EditSession::new(&mut model);
//! session.execute(Command::SelectPole1 { u: 1, v: 1 })?;
//! session.execute(Command::SelectPole2 { u: 3, v: 2 })?;
//! session.execute(Command::ApplyEdit { height: 20.0, weight: 1.0 })?;
//! assert_eq!(session.selected_poles().len(), 6);
//! # Ok::<(), nurbswb_session::SessionError>(())
//! ```

pub mod command;
pub mod error;
pub mod session;
pub mod sink;

pub use command::{Command, EditMode};
pub use error::{Result, SessionError};
pub use session::{EditSession, Outcome, PoleReading, Refresh, Selection, SessionState};
pub use sink::{GeometrySink, NullSink};

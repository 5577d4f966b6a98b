use approx::assert_relative_eq;
use nurbswb_kernel::{
    eased_height, ControlGrid, IsoCurve, NurbsError, ShapeKind, SurfaceConfig, SurfaceDescriptor,
    SurfaceEvaluator, SurfaceModel, WeightedPoint,
};
use nurbswb_math::Point3;
use nurbswb_session::{
    Command, EditMode, EditSession, GeometrySink, Outcome, SessionError, SessionState,
};

fn default_model() -> SurfaceModel {
    SurfaceModel::from_config(&SurfaceConfig::default()).unwrap()
}

fn select(session: &mut EditSession<'_, impl GeometrySink>, a: (usize, usize), b: (usize, usize)) {
    session
        .execute(Command::SelectPole1 { u: a.0, v: a.1 })
        .unwrap();
    session
        .execute(Command::SelectPole2 { u: b.0, v: b.1 })
        .unwrap();
}

#[derive(Default)]
struct Recorder {
    rebuilds: usize,
    wire_curves: usize,
    pole_lines: usize,
    selections: Vec<usize>,
    last_descriptor: Option<SurfaceDescriptor>,
}

impl GeometrySink for Recorder {
    fn surface_rebuilt(&mut self, descriptor: &SurfaceDescriptor, wireframe: &[IsoCurve]) {
        self.rebuilds += 1;
        self.wire_curves = wireframe.len();
        self.last_descriptor = Some(descriptor.clone());
    }

    fn poles_changed(&mut self, polylines: &[Vec<Point3>]) {
        self.pole_lines = polylines.len();
    }

    fn selection_changed(&mut self, poles: &[WeightedPoint]) {
        self.selections.push(poles.len());
    }
}

#[test]
fn single_pole_height_edit() {
    let mut model = default_model();
    {
        let mut session = EditSession::new(&mut model);
        session
            .execute(Command::SetSingleSelection { enabled: true })
            .unwrap();
        session.execute(Command::SelectPole1 { u: 2, v: 2 }).unwrap();
        let outcome = session
            .execute(Command::ApplyEdit {
                height: 50.0,
                weight: 1.0,
            })
            .unwrap();
        assert_eq!(outcome, Outcome::Rebuilt { poles_edited: 1 });

        let refresh = session.last_refresh().unwrap();
        let pole = refresh.descriptor.pole(2, 2).unwrap();
        // eased, not the raw dialog value
        assert_relative_eq!(pole.point.z, eased_height(50.0).unwrap(), epsilon = 1e-12);
        assert!(pole.point.z > 98.0 && pole.point.z < 99.0);

        let eval = SurfaceEvaluator::new(&refresh.descriptor).unwrap();
        let top = eval.evaluate(0.5, 0.5).unwrap();
        assert!(top.z > 0.0 && top.z < pole.point.z);
    }
    // only the selected pole moved
    for v in 0..5 {
        for u in 0..5 {
            let z = model.grid().get(u, v).unwrap().point.z;
            if (u, v) == (2, 2) {
                assert!(z > 0.0);
            } else {
                assert_eq!(z, 0.0);
            }
        }
    }
}

#[test]
fn absolute_edit_is_idempotent() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    select(&mut session, (1, 1), (1, 1));
    let edit = Command::ApplyEdit {
        height: 0.0,
        weight: 2.0,
    };
    session.execute(edit.clone()).unwrap();
    let first = session.selected_poles();
    session.execute(edit).unwrap();
    assert_eq!(session.selected_poles(), first);
    assert_eq!(first[0].point.z, 0.0);
    assert_eq!(first[0].weight, 2.0);
}

#[test]
fn selection_is_normalized() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    assert_eq!(session.state(), SessionState::Idle);
    select(&mut session, (3, 4), (1, 2));
    let sel = session.selection().unwrap();
    assert_eq!((sel.u1, sel.v1, sel.u2, sel.v2), (1, 2, 3, 4));
    assert_eq!(session.selected_poles().len(), 9);
    assert_eq!(session.state(), SessionState::Selecting);
}

#[test]
fn single_selection_ties_corners() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    select(&mut session, (0, 0), (3, 3));
    assert_eq!(session.selected_poles().len(), 16);

    session
        .execute(Command::SetSingleSelection { enabled: true })
        .unwrap();
    assert_eq!(session.selected_poles().len(), 1);
    session.execute(Command::SelectPole2 { u: 4, v: 1 }).unwrap();
    let sel = session.selection().unwrap();
    assert_eq!((sel.u1, sel.v1, sel.u2, sel.v2), (4, 1, 4, 1));
}

#[test]
fn select_outside_grid_fails() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    let err = session
        .execute(Command::SelectPole1 { u: 5, v: 0 })
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Kernel(NurbsError::OutOfRange { u: 5, .. })
    ));
    assert!(session.selection().is_none());
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn edit_without_selection_fails() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    let err = session
        .execute(Command::ApplyEdit {
            height: 10.0,
            weight: 1.0,
        })
        .unwrap_err();
    assert!(matches!(err, SessionError::NoSelection));
    assert!(matches!(
        session.execute(Command::Inspect),
        Err(SessionError::NoSelection)
    ));
    assert!(session.last_refresh().is_none());
}

#[test]
fn relative_mode_uses_baseline() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    select(&mut session, (2, 2), (2, 2));
    session
        .execute(Command::ApplyEdit {
            height: 20.0,
            weight: 1.0,
        })
        .unwrap();
    let start = session.selected_poles()[0].point.z;

    // entering relative mode snapshots the edited grid
    session
        .execute(Command::SetMode {
            mode: EditMode::Relative,
        })
        .unwrap();
    let delta = eased_height(10.0).unwrap();
    let edit = Command::ApplyEdit {
        height: 10.0,
        weight: 1.0,
    };
    session.execute(edit.clone()).unwrap();
    session.execute(edit.clone()).unwrap();
    let z = session.selected_poles()[0].point.z;
    assert_relative_eq!(z, start + delta, epsilon = 1e-9);

    // committing makes the next edit stack
    session.execute(Command::CommitRelativeBaseline).unwrap();
    session.execute(edit).unwrap();
    let z = session.selected_poles()[0].point.z;
    assert_relative_eq!(z, start + 2.0 * delta, epsilon = 1e-9);

    session
        .execute(Command::SetMode {
            mode: EditMode::Absolute,
        })
        .unwrap();
    session
        .execute(Command::ApplyEdit {
            height: 0.0,
            weight: 1.0,
        })
        .unwrap();
    assert_eq!(session.selected_poles()[0].point.z, 0.0);
}

#[test]
fn edit_skips_cells_lost_to_resize() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    select(&mut session, (3, 3), (4, 4));
    session.execute(Command::RemoveRow { v: 0 }).unwrap();
    session.execute(Command::RemoveColumn { u: 0 }).unwrap();
    // the grid is 4x4 now; only (3, 3) is still inside the selection
    let outcome = session
        .execute(Command::ApplyEdit {
            height: 30.0,
            weight: 1.0,
        })
        .unwrap();
    assert_eq!(outcome, Outcome::Rebuilt { poles_edited: 1 });
    assert!(session.model().grid().get(3, 3).unwrap().point.z > 0.0);
    assert_eq!(session.selected_poles().len(), 1);
}

#[test]
fn inserted_row_evaluates_on_blend() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    session
        .execute(Command::SetDegrees {
            degree_u: 1,
            degree_v: 1,
        })
        .unwrap();
    session
        .execute(Command::InsertRow { after: 2, pos: 0.25 })
        .unwrap();

    let refresh = session.last_refresh().unwrap();
    assert_eq!(refresh.descriptor.n_v, 6);
    let eval = SurfaceEvaluator::new(&refresh.descriptor).unwrap();
    // new row is index 2 of 6: v = 2/5, between y = 100 and y = 200
    for u in 0..5 {
        let p = eval.evaluate(u as f64 / 4.0, 0.4).unwrap();
        assert_relative_eq!(p.y, 125.0, epsilon = 1e-9);
        assert_relative_eq!(p.x, u as f64 * 100.0, epsilon = 1e-9);
        assert!(p.z.abs() < 1e-12);
    }
}

#[test]
fn insert_with_bad_index_fails() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    let err = session
        .execute(Command::InsertColumn { after: 0, pos: 0.5 })
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Kernel(NurbsError::InvalidIndex { index: 0, .. })
    ));
    assert_eq!(session.model().grid().n_u(), 5);
}

#[test]
fn failed_rebuild_rolls_back() {
    let grid = ControlGrid::flat(2, 2, 100.0, 100.0).unwrap();
    let mut model = SurfaceModel::new(grid, 1, 1)
        .unwrap()
        .with_shape(ShapeKind::Cylinder);
    let mut session = EditSession::new(&mut model);
    session
        .execute(Command::MovePole {
            u: 1,
            v: 0,
            dx: -100.0,
            dy: 0.0,
            dz: 0.0,
        })
        .unwrap();
    // collapsing the last x coordinate leaves no angular range
    let err = session
        .execute(Command::MovePole {
            u: 1,
            v: 1,
            dx: -100.0,
            dy: 0.0,
            dz: 0.0,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Kernel(NurbsError::DegenerateGrid { axis: "x" })
    ));
    assert_eq!(session.model().grid().get(1, 1).unwrap().point.x, 100.0);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn sink_receives_geometry() {
    let mut model = default_model();
    let mut recorder = Recorder::default();
    {
        let mut session = EditSession::with_sink(&mut model, &mut recorder).with_grid_count(4);
        select(&mut session, (0, 0), (1, 1));
        session
            .execute(Command::CreateWaves {
                height: 40.0,
                depth: -40.0,
            })
            .unwrap();
        session
            .execute(Command::InsertSColumn { after: 2 })
            .unwrap();
    }
    assert_eq!(recorder.rebuilds, 2);
    assert_eq!(recorder.wire_curves, 10);
    // 5 rows and 6 columns after the insert
    assert_eq!(recorder.pole_lines, 11);
    assert_eq!(recorder.selections, vec![1, 4, 4, 4]);
    assert_eq!(recorder.last_descriptor.unwrap().n_u, 6);
}

#[test]
fn configured_grid_count_reaches_sink() {
    let config = SurfaceConfig::from_toml_str("grid_count = 3").unwrap();
    let mut model = SurfaceModel::from_config(&config).unwrap();
    let mut session = EditSession::with_sink(&mut model, Recorder::default());
    session
        .execute(Command::ElevateULine { v: 2, z: 15.0 })
        .unwrap();
    // 4 curves of constant u and 4 of constant v
    assert_eq!(session.sink().wire_curves, 8);
    assert_eq!(session.last_refresh().unwrap().wireframe.len(), 8);
}

#[test]
fn refresh_rebuilds_without_editing() {
    let mut model = default_model();
    let before = model.grid().clone();
    let mut session = EditSession::with_sink(&mut model, Recorder::default());
    select(&mut session, (1, 3), (2, 1));
    session.refresh().unwrap();

    let sink = session.sink();
    assert_eq!(sink.rebuilds, 1);
    assert_eq!(sink.wire_curves, 14);
    assert_eq!(sink.pole_lines, 10);
    // two selection updates, then the one sent with the rebuild
    assert_eq!(sink.selections, vec![1, 6, 6]);
    assert_eq!(session.model().grid(), &before);

    let sel = session.selection().unwrap();
    assert!(sel.contains(1, 1) && sel.contains(2, 3) && sel.contains(1, 2));
    assert!(!sel.contains(0, 2) && !sel.contains(3, 2) && !sel.contains(2, 4));
}

#[test]
fn inspect_reads_cursor_pole() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    session
        .execute(Command::ElevateULine { v: 3, z: 12.5 })
        .unwrap();
    session.execute(Command::SelectPole1 { u: 2, v: 3 }).unwrap();
    match session.execute(Command::Inspect).unwrap() {
        Outcome::Pole(reading) => {
            assert_eq!((reading.u, reading.v), (2, 3));
            assert_eq!(reading.z, 12.5);
            assert_eq!(reading.weight, 1.0);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn elevation_commands() {
    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    let outcome = session
        .execute(Command::ElevateRectangle {
            u: 3,
            v: 3,
            du: 4,
            dv: 4,
            z: 10.0,
        })
        .unwrap();
    assert_eq!(outcome, Outcome::Rebuilt { poles_edited: 4 });

    let outcome = session
        .execute(Command::ElevateCircle {
            u: 0,
            v: 0,
            radius: 100.0,
            z: 5.0,
        })
        .unwrap();
    assert_eq!(outcome, Outcome::Rebuilt { poles_edited: 3 });

    let outcome = session
        .execute(Command::ElevateCircleBox {
            u: 2,
            v: 2,
            radius: 1,
            z: 7.0,
        })
        .unwrap();
    assert_eq!(outcome, Outcome::Rebuilt { poles_edited: 9 });
    assert_eq!(session.model().grid().get(3, 3).unwrap().point.z, 7.0);
    assert_eq!(session.model().grid().get(4, 4).unwrap().point.z, 10.0);

    session
        .execute(Command::ElevateVLine { u: 4, z: -3.0 })
        .unwrap();
    let grid = session.model().grid();
    assert_eq!(grid.get(4, 0).unwrap().point.z, 0.0);
    assert_eq!(grid.get(4, 2).unwrap().point.z, -3.0);
}

#[test]
fn torus_ignores_grid_edits() {
    let config = SurfaceConfig {
        shape: ShapeKind::Torus,
        ..SurfaceConfig::default()
    };
    let mut model = SurfaceModel::from_config(&config).unwrap();
    let mut session = EditSession::new(&mut model);
    session
        .execute(Command::MovePole {
            u: 0,
            v: 0,
            dx: 0.0,
            dy: 0.0,
            dz: 50.0,
        })
        .unwrap();
    let d = &session.last_refresh().unwrap().descriptor;
    assert_eq!((d.n_u, d.n_v), (7, 4));
    assert!(d.periodic_u && d.periodic_v);
    assert!(session
        .last_refresh()
        .unwrap()
        .wireframe
        .iter()
        .flat_map(|c| c.points.iter())
        .all(|p| p.coords.iter().all(|c| c.is_finite())));
}

#[test]
fn commands_replay_from_json() {
    let script = r#"[
        {"type": "SelectPole1", "u": 1, "v": 1},
        {"type": "SelectPole2", "u": 2, "v": 1},
        {"type": "SetMode", "mode": "Relative"},
        {"type": "ApplyEdit", "height": 25.0, "weight": 1.5},
        {"type": "SetDegrees", "degree_u": 2, "degree_v": 2},
        {"type": "Inspect"}
    ]"#;
    let commands: Vec<Command> = serde_json::from_str(script).unwrap();
    assert_eq!(commands.len(), 6);

    let mut model = default_model();
    let mut session = EditSession::new(&mut model);
    let mut last = Outcome::Unchanged;
    for command in commands {
        last = session.execute(command).unwrap();
    }
    match last {
        Outcome::Pole(reading) => {
            assert_relative_eq!(reading.z, eased_height(25.0).unwrap(), epsilon = 1e-12);
            assert_eq!(reading.weight, 1.5);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(session.model().degrees(), (2, 2));
    assert_eq!(session.mode(), EditMode::Relative);
}

#[test]
fn sessions_on_separate_models_are_independent() {
    let mut a = default_model();
    let mut b = default_model();
    let mut sa = EditSession::new(&mut a);
    let mut sb = EditSession::new(&mut b);
    select(&mut sa, (1, 1), (1, 1));
    select(&mut sb, (3, 3), (3, 3));
    sa.execute(Command::ApplyEdit {
        height: 10.0,
        weight: 1.0,
    })
    .unwrap();
    assert_eq!(sb.model().grid().get(1, 1).unwrap().point.z, 0.0);
    assert!(sa.model().grid().get(1, 1).unwrap().point.z > 0.0);
}

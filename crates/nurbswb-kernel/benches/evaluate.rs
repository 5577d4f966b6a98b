use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nurbswb_kernel::{ControlGrid, ShapeKind, SurfaceEvaluator, SurfaceModel};

fn dome(n: usize) -> SurfaceModel {
    let mut grid = ControlGrid::flat(n, n, 100.0, 100.0).unwrap();
    for v in 1..n - 1 {
        for u in 1..n - 1 {
            grid.set_point_height(u, v, 40.0, 1.0).unwrap();
        }
    }
    SurfaceModel::new(grid, 3, 3).unwrap()
}

fn bench_evaluate(c: &mut Criterion) {
    let eval = SurfaceEvaluator::new(&dome(10).build(None).unwrap()).unwrap();
    c.bench_function("evaluate_point", |b| {
        b.iter(|| eval.evaluate(black_box(0.37), black_box(0.61)).unwrap())
    });
}

fn bench_sample_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_grid");
    for (name, shape) in [
        ("free", ShapeKind::Free),
        ("cylinder", ShapeKind::Cylinder),
        ("torus", ShapeKind::Torus),
    ] {
        let model = dome(10).with_shape(shape);
        let eval = SurfaceEvaluator::new(&model.build(None).unwrap()).unwrap();
        group.bench_function(name, |b| b.iter(|| eval.sample_grid(black_box(20), 20)));
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut model = dome(8);
    c.bench_function("edit_and_rebuild", |b| {
        b.iter(|| {
            model.grid_mut().set_point_height(3, 4, 60.0, 1.0).unwrap();
            let eval = SurfaceEvaluator::new(&model.build(None).unwrap()).unwrap();
            eval.sample_grid(6, 6)
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_sample_grid, bench_rebuild);
criterion_main!(benches);

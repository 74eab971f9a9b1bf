use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridengine::boundary::apply_boundary_conditions;
use gridengine::briggs::BriggsCoeffs;
use gridengine::geometry::StrideGeometry;
use gridengine::relax::sweep;
use gridengine::stencil::StencilCoeffs;
use gridengine::types::NodeStatus;

fn relax_sweep_benchmark(c: &mut Criterion) {
    let geom = StrideGeometry::new(1, 129, 129, 1.0, 1.0, 0.0, 0.0);
    let mut values = vec![0.0f32; geom.mx * geom.my];
    for (i, v) in values.iter_mut().enumerate() {
        *v = (i % 13) as f32 * 0.1;
    }
    let status = vec![NodeStatus::Unconstrained; geom.mx * geom.my];
    let briggs: Vec<BriggsCoeffs> = Vec::new();
    let stencil = StencilCoeffs::new(0.25, 1.0);

    c.bench_function("relax_sweep_129x129", |b| {
        b.iter(|| {
            apply_boundary_conditions(&mut values, &geom, 0.5, 1.0, false);
            let max_change = sweep(
                black_box(&mut values),
                black_box(&status),
                black_box(&briggs),
                &geom,
                &stencil,
                0.0,
                1.4,
                None,
            );
            black_box(max_change);
        })
    });
}

criterion_group!(benches, relax_sweep_benchmark);
criterion_main!(benches);

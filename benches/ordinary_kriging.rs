use criterion::{black_box, criterion_group, criterion_main, Criterion};
use okrige::prelude::*;

fn create_sample_set(domain: [[f64; 2]; 2], n_points: usize) -> SampleSet {
    let samples = (0..n_points)
        .map(|_| {
            let x = rand::random::<f64>() * (domain[1][0] - domain[0][0]) + domain[0][0];
            let y = rand::random::<f64>() * (domain[1][1] - domain[0][1]) + domain[0][1];
            let v = rand::random::<f64>();
            (x, y, v)
        })
        .collect::<Vec<_>>();
    SampleSet::new(samples).unwrap()
}

fn create_vgram(range: f64, sill: f64) -> VariogramModel {
    VariogramModel::new(VariogramKind::Spherical, 0.05 * sill, sill, range).unwrap()
}

fn ordinary_kriging(
    interpolator: &GridInterpolator,
    samples: &SampleSet,
    vgram: &VariogramModel,
    grid: &GridDefinition,
) -> KrigedGrid {
    interpolator.interpolate(samples, vgram, grid)
}

fn criterion_benchmark(c: &mut Criterion) {
    let domain = [[0.0, 0.0], [1000.0, 1000.0]];
    let samples = create_sample_set(domain, 500);
    let vgram = create_vgram(250.0, 1.0);
    let grid = GridDefinition::from_bounds(&samples.bounds(), 10.0).unwrap();

    let mut group = c.benchmark_group("ordinary kriging 500 samples");
    group.sample_size(10);

    for execution in [Execution::Sequential, Execution::Parallel] {
        let interpolator = GridInterpolator::new(InterpolationParams {
            execution,
            ..Default::default()
        });
        group.bench_function(format!("{execution:?}"), |b| {
            b.iter(|| {
                ordinary_kriging(
                    black_box(&interpolator),
                    black_box(&samples),
                    black_box(&vgram),
                    black_box(&grid),
                )
            })
        });
    }

    group.bench_function("factor", |b| {
        b.iter(|| {
            OrdinaryKrigingSystem::new(
                black_box(&samples),
                black_box(&vgram),
                SolverParams::default(),
            )
            .is_singular()
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use heatgrid_core::{
    Coordinate, CriteriaSet, Criterion as Rule, CriterionKind, Grid, Precision, ReductionMethod,
};
use heatgrid_engine::{reduce_grid, score_grid, ReducerConfig, Scorer};

fn city_grid(side: usize) -> Grid {
    let step = 0.3 / side as f64;
    let points = (0..side * side)
        .map(|idx| {
            let (row, col) = (idx / side, idx % side);
            Coordinate::new(45.60 + row as f64 * step, 4.70 + col as f64 * step)
                .expect("coordinate")
        })
        .collect();
    Grid::new("bench", points)
}

fn criteria() -> CriteriaSet {
    let features: Vec<Coordinate> = (0..64)
        .map(|idx| {
            let offset = idx as f64 * 0.004;
            Coordinate::new(45.62 + offset, 4.72 + offset).expect("feature")
        })
        .collect();
    CriteriaSet::new(
        "bench",
        [
            Rule::new(
                "proximity",
                2.0,
                CriterionKind::Proximity {
                    features: features.clone(),
                    radius_m: 1_500.0,
                },
            )
            .expect("proximity"),
            Rule::new(
                "density",
                1.0,
                CriterionKind::Density {
                    features,
                    radius_m: 800.0,
                    saturation: 4,
                },
            )
            .expect("density"),
        ],
    )
    .expect("criteria")
}

fn bench_score(c: &mut Criterion) {
    let grid = city_grid(100);
    let criteria = criteria();
    let scorer = Scorer::default();
    c.bench_function("score_grid_10k", |b| {
        b.iter(|| score_grid(&scorer, black_box(&grid), &criteria).expect("score"));
    });
}

fn bench_reduce(c: &mut Criterion) {
    let grid = city_grid(200);
    let config = ReducerConfig::default();
    let precision = Precision::new(100.0).expect("precision");
    for method in [ReductionMethod::Fgr, ReductionMethod::Qcgr] {
        c.bench_function(&format!("reduce_{method}_40k"), |b| {
            b.iter(|| reduce_grid(black_box(&grid), precision, method, &config).expect("reduce"));
        });
    }
}

criterion_group!(benches, bench_score, bench_reduce);
criterion_main!(benches);

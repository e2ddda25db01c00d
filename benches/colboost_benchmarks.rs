use colboost::data::{FeatureColumns, Matrix};
use colboost::exactsplitter::{ExactSplitter, ROOT};
use colboost::gradientbooster::GradientBooster;
use colboost::tree::Tree;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn make_data(rows: usize, cols: usize) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(0);
    let data: Vec<f64> = (0..(rows * cols))
        .map(|_| {
            if rng.gen_range(0.0..1.0) < 0.1 {
                f64::NAN
            } else {
                f64::from(rng.gen_range(0..200)) / 10.0
            }
        })
        .collect();
    let y = (0..rows)
        .map(|i| {
            let x = data[i];
            let x = if x.is_nan() { 10.0 } else { x };
            (x / 4.0).sin() + rng.gen_range(-0.2..0.2)
        })
        .collect();
    (data, y)
}

pub fn splitter_benchmarks(c: &mut Criterion) {
    let (rows, cols) = (20_000, 8);
    let (data_vec, y) = make_data(rows, cols);
    let data = Matrix::new(&data_vec, rows, cols);
    let columns = FeatureColumns::from_matrix(&data);
    let yhat = vec![0.0; rows];

    c.bench_function("Root Split Single Node", |b| {
        let mut splitter = ExactSplitter::new(&columns, 1.0, 0.0);
        let root = splitter.compute_gradients(&yhat, &y).unwrap();
        b.iter(|| splitter.best_split_for_node(black_box(ROOT), black_box(&root)))
    });
    c.bench_function("Root Split Batched", |b| {
        let mut splitter = ExactSplitter::new(&columns, 1.0, 0.0);
        splitter.compute_gradients(&yhat, &y).unwrap();
        b.iter(|| splitter.find_best_splits())
    });
    c.bench_function("Train Tree (Single Threaded)", |b| {
        let mut splitter = ExactSplitter::new(&columns, 1.0, 0.0);
        b.iter(|| {
            let mut tree = Tree::new();
            tree.fit(&mut splitter, black_box(&yhat), black_box(&y), black_box(5))
                .unwrap();
        })
    });
    c.bench_function("Train Tree (Multi Threaded)", |b| {
        let mut splitter = ExactSplitter::new(&columns, 1.0, 0.0).set_parallel(true);
        b.iter(|| {
            let mut tree = Tree::new();
            tree.fit(&mut splitter, black_box(&yhat), black_box(&y), black_box(5))
                .unwrap();
        })
    });

    c.bench_function("Train Booster", |b| {
        b.iter(|| {
            let mut booster = GradientBooster::default();
            booster.fit(black_box(&data), black_box(&y)).unwrap();
        })
    });
    let mut booster = GradientBooster::default();
    booster.fit(&data, &y).unwrap();
    c.bench_function("Predict Booster", |b| {
        b.iter(|| booster.predict(&data, true))
    });
}

criterion_group!(benches, splitter_benchmarks);
criterion_main!(benches);

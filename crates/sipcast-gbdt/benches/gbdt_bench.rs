//! Criterion benchmarks for sipcast-gbdt: boosting training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};

use sipcast_gbdt::GradientBoostingConfig;

fn make_sales(n_samples: usize, n_classes: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let temperature = (i % 80) as f64 * 0.45;
        let weather = (i % 4) as f64;
        let band = ((temperature / 36.0) * n_classes as f64) as usize;
        features.push(vec![temperature, weather]);
        labels.push((band + i % 2) % n_classes);
    }
    (features, labels)
}

fn bench_train(c: &mut Criterion) {
    let (features, labels) = make_sales(1000, 6);
    let cfg = GradientBoostingConfig::new(50).unwrap().with_seed(Some(42));

    c.bench_function("gbdt_train_1000x2_6class_50rounds", |b| {
        b.iter(|| cfg.fit(&features, &labels, 6).unwrap());
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, labels) = make_sales(1000, 6);
    let model = GradientBoostingConfig::new(50)
        .unwrap()
        .with_seed(Some(42))
        .fit(&features, &labels, 6)
        .unwrap();

    c.bench_function("gbdt_predict_batch_1000x2_50rounds", |b| {
        b.iter(|| model.predict_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_predict_batch);
criterion_main!(benches);

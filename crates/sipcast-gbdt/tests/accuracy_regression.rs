//! Accuracy regression tests for sipcast-gbdt.
//!
//! These tests verify that algorithmic changes do not degrade boosting
//! accuracy on a deterministic synthetic sales-like dataset.

use sipcast_gbdt::{GbdtError, GradientBoostingConfig};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic dataset
// ---------------------------------------------------------------------------

/// Generate a 240-sample, 2-feature, 4-class dataset.
///
/// Feature 0 is a temperature in [0, 36); feature 1 is a weather code in 0..3.
/// Hot days favour class 0, cold days class 1, rainy mild days class 2 and
/// dry mild days class 3.
fn make_sales() -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut features = Vec::with_capacity(240);
    let mut labels = Vec::with_capacity(240);
    for i in 0..240 {
        let temperature = (i % 72) as f64 * 0.5;
        let weather = (i % 3) as f64;
        let label = if temperature >= 26.0 {
            0
        } else if temperature < 10.0 {
            1
        } else if weather == 1.0 {
            2
        } else {
            3
        };
        features.push(vec![temperature, weather]);
        labels.push(label);
    }
    (features, labels)
}

fn accuracy(predictions: &[usize], labels: &[usize]) -> f64 {
    let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
    correct as f64 / labels.len() as f64
}

// ---------------------------------------------------------------------------
// a) training_accuracy_above_threshold
// ---------------------------------------------------------------------------

/// The rule-generated labels are learnable exactly with depth-3 trees.
#[test]
fn training_accuracy_above_threshold() {
    let (features, labels) = make_sales();
    let model = GradientBoostingConfig::new(50)
        .unwrap()
        .with_max_depth(3)
        .with_seed(Some(42))
        .fit(&features, &labels, 4)
        .unwrap();

    let acc = accuracy(&model.predict_batch(&features).unwrap(), &labels);
    assert!(acc > 0.97, "training accuracy {acc} <= 0.97");
}

// ---------------------------------------------------------------------------
// b) probabilities_are_distributions
// ---------------------------------------------------------------------------

#[test]
fn probabilities_are_distributions() {
    let (features, labels) = make_sales();
    let model = GradientBoostingConfig::new(20)
        .unwrap()
        .fit(&features, &labels, 4)
        .unwrap();

    for sample in features.iter().step_by(7) {
        let dist = model.predict_proba(sample).unwrap();
        let sum: f64 = dist.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum = {sum}");
        assert!(dist.as_slice().iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert_eq!(dist.top_k(1)[0].0, dist.predicted_class());
    }
}

// ---------------------------------------------------------------------------
// c) unseeded_models_agree_on_clear_cases
// ---------------------------------------------------------------------------

/// Without subsampling the fit is deterministic even when unseeded.
#[test]
fn unseeded_models_agree_on_clear_cases() {
    let (features, labels) = make_sales();
    let fit = || {
        GradientBoostingConfig::new(30)
            .unwrap()
            .with_max_depth(3)
            .fit(&features, &labels, 4)
            .unwrap()
    };
    let a = fit();
    let b = fit();
    assert_eq!(a.predict(&[33.0, 0.0]).unwrap(), 0);
    assert_eq!(b.predict(&[33.0, 0.0]).unwrap(), 0);
    assert_eq!(a.predict(&[3.0, 2.0]).unwrap(), b.predict(&[3.0, 2.0]).unwrap());
}

// ---------------------------------------------------------------------------
// d) prediction_width_checked
// ---------------------------------------------------------------------------

#[test]
fn prediction_width_checked() {
    let (features, labels) = make_sales();
    let model = GradientBoostingConfig::new(2)
        .unwrap()
        .fit(&features, &labels, 4)
        .unwrap();
    let err = model.predict(&[20.0, 1.0, 0.0]).unwrap_err();
    assert!(matches!(
        err,
        GbdtError::PredictionFeatureMismatch { expected: 2, got: 3 }
    ));
    assert!(model.predict_proba(&[20.0]).is_err());
}

//! Weighted logistic regression
//!
//! Gradient descent on the sample-weighted log loss with an L2 penalty.
//! Predictors are z-scored against the training segment; the fitted means
//! and deviations travel with the model so scoring applies the identical
//! transform. Weight initialization is drawn from a seeded ChaCha8 stream,
//! so the same data and seed reproduce the same coefficients bit for bit.

use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Iteration cap for gradient descent
pub const MAX_ITERATIONS: usize = 500;

const LEARNING_RATE: f64 = 0.1;
const L2_PENALTY: f64 = 0.01;
const TOLERANCE: f64 = 1e-8;

/// Fitted logistic regression parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Coefficients in the standardized predictor space
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    /// Per-column training means for z-scoring
    pub feature_means: Array1<f64>,
    /// Per-column training standard deviations for z-scoring
    pub feature_stds: Array1<f64>,
}

impl LogisticModel {
    /// Fit on a predictor matrix and 0/1 labels with per-sample weights.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, sample_weights: &Array1<f64>, seed: u64) -> Self {
        let n_features = x.ncols();
        let means = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let stds = x.std_axis(Axis(0), 0.0);
        let xs = standardize(x, &means, &stds);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut weights =
            Array1::from_shape_fn(n_features, |_| rng.gen_range(-0.01..0.01));
        let mut intercept = 0.0;

        let weight_sum = sample_weights.sum();
        let mut prev_loss = f64::INFINITY;

        for iteration in 0..MAX_ITERATIONS {
            let linear = xs.dot(&weights) + intercept;
            let probs = linear.mapv(sigmoid);

            let errors = (&probs - y) * sample_weights;
            let grad_w = xs.t().dot(&errors) / weight_sum + &weights * L2_PENALTY;
            let grad_b = errors.sum() / weight_sum;

            weights = &weights - &(grad_w * LEARNING_RATE);
            intercept -= LEARNING_RATE * grad_b;

            let loss = weighted_log_loss(y, &probs, sample_weights, weight_sum);
            if (prev_loss - loss).abs() < TOLERANCE {
                log::debug!("logistic regression converged at iteration {iteration}");
                break;
            }
            prev_loss = loss;
        }

        Self {
            coefficients: weights,
            intercept,
            feature_means: means,
            feature_stds: stds,
        }
    }

    /// Positive-class probability for each row of `x`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        let xs = standardize(x, &self.feature_means, &self.feature_stds);
        (xs.dot(&self.coefficients) + self.intercept).mapv(sigmoid)
    }
}

/// Z-score columns; constant columns map to zero instead of dividing by a
/// vanishing deviation
fn standardize(x: &Array2<f64>, means: &Array1<f64>, stds: &Array1<f64>) -> Array2<f64> {
    let mut xs = x.to_owned();
    for j in 0..x.ncols() {
        let mut column = xs.column_mut(j);
        if stds[j] > 1e-12 {
            let (mean, std) = (means[j], stds[j]);
            column.mapv_inplace(|v| (v - mean) / std);
        } else {
            column.fill(0.0);
        }
    }
    xs
}

/// Numerically stable sigmoid
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn weighted_log_loss(
    y: &Array1<f64>,
    probs: &Array1<f64>,
    sample_weights: &Array1<f64>,
    weight_sum: f64,
) -> f64 {
    let eps = 1e-15;
    let total: f64 = y
        .iter()
        .zip(probs.iter())
        .zip(sample_weights.iter())
        .map(|((&label, &p), &w)| {
            let p = p.clamp(eps, 1.0 - eps);
            w * (label * p.ln() + (1.0 - label) * (1.0 - p).ln())
        })
        .sum();
    -total / weight_sum
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Separable data: positives sit above x = 5
    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(20, |i| if i >= 10 { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(40.0) > 0.999);
        assert!(sigmoid(-40.0) < 0.001);
    }

    #[test]
    fn test_fit_learns_separable_direction() {
        let (x, y) = separable();
        let weights = Array1::ones(20);
        let model = LogisticModel::fit(&x, &y, &weights, 42);

        // Higher x must mean higher probability
        assert!(model.coefficients[0] > 0.0);
        let probs = model.predict_proba(&x);
        assert!(probs[0] < 0.5);
        assert!(probs[19] > 0.5);
    }

    #[test]
    fn test_fit_is_deterministic_given_seed() {
        let (x, y) = separable();
        let weights = Array1::ones(20);

        let a = LogisticModel::fit(&x, &y, &weights, 42);
        let b = LogisticModel::fit(&x, &y, &weights, 42);
        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.intercept, b.intercept);
    }

    #[test]
    fn test_sample_weights_shift_the_boundary() {
        let (x, y) = separable();
        // Up-weighting positives pushes predicted probabilities up
        let mut heavy_pos = Array1::ones(20);
        for i in 10..20 {
            heavy_pos[i] = 5.0;
        }

        let balanced = LogisticModel::fit(&x, &y, &Array1::ones(20), 42);
        let skewed = LogisticModel::fit(&x, &y, &heavy_pos, 42);

        let mid = Array2::from_shape_vec((1, 1), vec![9.5]).unwrap();
        assert!(skewed.predict_proba(&mid)[0] > balanced.predict_proba(&mid)[0]);
    }

    #[test]
    fn test_constant_column_gets_zero_coefficient_influence() {
        let mut x = Array2::zeros((20, 2));
        for i in 0..20 {
            x[[i, 0]] = i as f64;
            x[[i, 1]] = 3.0; // constant
        }
        let y = Array1::from_shape_fn(20, |i| if i >= 10 { 1.0 } else { 0.0 });

        let model = LogisticModel::fit(&x, &y, &Array1::ones(20), 42);
        let probs = model.predict_proba(&x);
        // The constant column must not destabilize predictions
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[19] > probs[0]);
    }
}

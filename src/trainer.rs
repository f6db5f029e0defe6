//! Model training
//!
//! Fits one artifact per configured classifier variant on the train segment.
//! Class-imbalance correction reweights samples by inverse class frequency
//! (`n / (2 * n_class)`), so minority positive days carry proportional loss
//! instead of being drowned out.

use crate::error::PipelineError;
use crate::model::{
    FittedModel, LogisticModel, ModelArtifact, ModelConfig, ModelVariant, TreeModel,
};
use crate::types::FeatureTable;
use ndarray::Array1;

/// Default seed matching the reference analysis
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default depth bound for the tree variant
pub const DEFAULT_TREE_MAX_DEPTH: usize = 5;

/// Training configuration shared across variants
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrainingConfig {
    /// Variants to fit, in order
    pub model_variants: Vec<ModelVariant>,
    pub class_balance: bool,
    pub random_seed: u64,
    pub tree_max_depth: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_variants: vec![ModelVariant::Linear, ModelVariant::Tree],
            class_balance: true,
            random_seed: DEFAULT_RANDOM_SEED,
            tree_max_depth: DEFAULT_TREE_MAX_DEPTH,
        }
    }
}

/// Trainer producing one artifact per configured variant
pub struct ModelTrainer;

impl ModelTrainer {
    pub fn train(
        train: &FeatureTable,
        config: &TrainingConfig,
    ) -> Result<Vec<ModelArtifact>, PipelineError> {
        let n = train.len();
        let positives = train.positive_count();
        let negatives = n - positives;
        if positives == 0 || negatives == 0 {
            return Err(PipelineError::TrainingData(format!(
                "train segment holds a single label class \
                 ({positives} positive / {negatives} negative of {n} rows)"
            )));
        }

        let sample_weights = if config.class_balance {
            balanced_sample_weights(&train.y)
        } else {
            Array1::ones(n)
        };

        let mut artifacts = Vec::with_capacity(config.model_variants.len());
        for &variant in &config.model_variants {
            let model = match variant {
                ModelVariant::Linear => FittedModel::Linear(LogisticModel::fit(
                    &train.x,
                    &train.y,
                    &sample_weights,
                    config.random_seed,
                )),
                ModelVariant::Tree => FittedModel::Tree(TreeModel::fit(
                    &train.x,
                    &train.y,
                    &sample_weights,
                    config.tree_max_depth,
                )),
            };
            log::info!(
                "trained {} model on {} rows ({} positive)",
                variant.as_str(),
                n,
                positives
            );
            artifacts.push(ModelArtifact {
                config: ModelConfig {
                    variant,
                    class_balance: config.class_balance,
                    random_seed: config.random_seed,
                    tree_max_depth: config.tree_max_depth,
                },
                feature_names: train.feature_names.clone(),
                model,
            });
        }

        Ok(artifacts)
    }
}

/// Per-sample weight `n / (2 * n_class)`: each class contributes half of the
/// total loss regardless of its raw count
fn balanced_sample_weights(y: &Array1<f64>) -> Array1<f64> {
    let n = y.len() as f64;
    let positives = y.iter().filter(|&&v| v >= 0.5).count() as f64;
    let negatives = n - positives;

    let positive_weight = n / (2.0 * positives);
    let negative_weight = n / (2.0 * negatives);

    y.mapv(|label| {
        if label >= 0.5 {
            positive_weight
        } else {
            negative_weight
        }
    })
}

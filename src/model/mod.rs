//! Classifier variants
//!
//! Two variants share one fit/predict/explain contract through a tagged
//! enum: an interpretable linear-coefficient model and a depth-bounded
//! classification tree. Dispatch is by variant tag, not type branching.

pub mod logistic;
pub mod tree;

pub use logistic::LogisticModel;
pub use tree::TreeModel;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Classifier variant selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    Linear,
    Tree,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Linear => "linear",
            ModelVariant::Tree => "tree",
        }
    }
}

/// Configuration one artifact was trained under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub variant: ModelVariant,
    /// Inverse-frequency class reweighting applied during training
    pub class_balance: bool,
    pub random_seed: u64,
    /// Depth bound for the tree variant (ignored by the linear variant)
    pub tree_max_depth: usize,
}

/// Fitted parameters, tagged by variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    Linear(LogisticModel),
    Tree(TreeModel),
}

/// One trained classifier: fitted parameters, the ordered feature names it
/// was trained on, and its configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub config: ModelConfig,
    /// Training feature names in matrix column order; evaluation input must
    /// match these exactly
    pub feature_names: Vec<String>,
    pub model: FittedModel,
}

impl ModelArtifact {
    /// Positive-class probability for each row of `x`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        match &self.model {
            FittedModel::Linear(m) => m.predict_proba(x),
            FittedModel::Tree(m) => m.predict_proba(x),
        }
    }

    /// Per-feature interpretability values in training column order:
    /// signed standardized coefficients for the linear variant, normalized
    /// non-negative importances for the tree variant.
    pub fn explain(&self) -> Vec<(String, f64)> {
        let weights: Vec<f64> = match &self.model {
            FittedModel::Linear(m) => m.coefficients.to_vec(),
            FittedModel::Tree(m) => m.importances().to_vec(),
        };
        self.feature_names
            .iter()
            .cloned()
            .zip(weights)
            .collect()
    }
}

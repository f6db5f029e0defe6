//! Model evaluation and interpretability
//!
//! Scores a fitted artifact on the held-out test segment: confusion matrix
//! at a fixed decision threshold, precision/recall/F1/accuracy, ROC-AUC
//! across thresholds, and the per-feature interpretability listing.

use crate::error::PipelineError;
use crate::metrics::{roc_auc, ConfusionMatrix};
use crate::model::{ModelArtifact, ModelVariant};
use crate::types::FeatureTable;
use serde::{Deserialize, Serialize};

/// Decision threshold used for the confusion matrix
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Evaluation result for one model variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub variant: ModelVariant,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
    /// (feature name, signed coefficient or normalized importance) in
    /// training column order
    pub feature_weights: Vec<(String, f64)>,
}

/// Evaluator scoring artifacts against the test segment
pub struct Evaluator;

impl Evaluator {
    pub fn evaluate(
        artifact: &ModelArtifact,
        test: &FeatureTable,
    ) -> Result<EvaluationReport, PipelineError> {
        if test.feature_names != artifact.feature_names {
            return Err(PipelineError::EvaluationInputMismatch(format!(
                "test columns {:?} do not match training columns {:?}",
                test.feature_names, artifact.feature_names
            )));
        }

        let probabilities = artifact.predict_proba(&test.x);
        let predicted = probabilities.mapv(|p| {
            if p >= DEFAULT_DECISION_THRESHOLD {
                1.0
            } else {
                0.0
            }
        });

        let confusion = ConfusionMatrix::from_predictions(&test.y, &predicted);
        let report = EvaluationReport {
            variant: artifact.config.variant,
            confusion,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            roc_auc: roc_auc(&test.y, &probabilities),
            feature_weights: artifact.explain(),
        };

        log::info!(
            "evaluated {} model: auc={:.3} f1={:.3} over {} test rows",
            report.variant.as_str(),
            report.roc_auc,
            report.f1,
            test.len()
        );

        Ok(report)
    }
}

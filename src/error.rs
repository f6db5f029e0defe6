//! Error types for the habitcast pipeline

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during a pipeline run.
///
/// Every stage validates its own preconditions and fails fast with the
/// failing source/row/column context; nothing is retried or silently
/// defaulted downstream.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Source '{source_name}' has more than one row for {date}")]
    SourceMisalignment {
        source_name: String,
        date: NaiveDate,
    },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Leakage configuration rejected: {0}")]
    LeakageConfiguration(String),

    #[error("Column '{column}' not found: {context}")]
    ColumnNotFound { column: String, context: String },

    #[error("Insufficient data for split: {0}")]
    InsufficientData(String),

    #[error("Training data invalid: {0}")]
    TrainingData(String),

    #[error("Evaluation input mismatch: {0}")]
    EvaluationInputMismatch(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

//! Habitcast - Temporal feature pipeline for next-day habit prediction
//!
//! Habitcast turns multi-source daily behavioral signals into a next-day
//! binary purchase prediction through a deterministic pipeline: source
//! alignment → leakage-safe feature construction → chronological split →
//! weighted training → held-out evaluation.
//!
//! ## Modules
//!
//! - **Aligner**: Merge per-source daily tables over the union of dates
//! - **Features**: Pair day-*i* predictors with day-*i+1* labels
//! - **Splitter**: Chronological train/test split, never a shuffle
//! - **Model**: Interpretable linear and depth-bounded tree variants
//! - **Evaluator**: Confusion metrics, ROC-AUC, feature attributions

pub mod aligner;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod splitter;
pub mod trainer;
pub mod types;

pub use aligner::DataAligner;
pub use error::PipelineError;
pub use evaluator::{EvaluationReport, Evaluator};
pub use features::{FeatureBuilder, FeatureConfig};
pub use model::{FittedModel, ModelArtifact, ModelConfig, ModelVariant};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineRun, RunProvenance};
pub use splitter::Splitter;
pub use trainer::{ModelTrainer, TrainingConfig};

// Schema exports
pub use schema::{ColumnSpec, ImputeStrategy, SignalDomain, TableSchema};

// Data product exports
pub use types::{AlignedTable, DailyObservation, FeatureTable, SourceTable};

/// Habitcast version embedded in all run outputs
pub const HABITCAST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for run provenance
pub const PRODUCER_NAME: &str = "habitcast";

//! End-to-end pipeline orchestration
//!
//! Chains the five stages into one run: align sources, build the supervised
//! feature table, split chronologically, train the configured variants, and
//! evaluate each on the held-out segment. The run product carries a
//! provenance block so any serialized output can be traced back to the
//! producing run.

use crate::aligner::DataAligner;
use crate::error::PipelineError;
use crate::evaluator::{EvaluationReport, Evaluator};
use crate::features::{FeatureBuilder, FeatureConfig};
use crate::model::ModelVariant;
use crate::schema::TableSchema;
use crate::splitter::{Splitter, DEFAULT_SPLIT_FRACTION};
use crate::trainer::{ModelTrainer, TrainingConfig, DEFAULT_RANDOM_SEED, DEFAULT_TREE_MAX_DEPTH};
use crate::types::{AlignedTable, FeatureTable, SourceTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full-run configuration covering every stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub features: FeatureConfig,
    pub split_fraction: f64,
    pub model_variants: Vec<ModelVariant>,
    pub class_balance: bool,
    pub random_seed: u64,
    pub tree_max_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            split_fraction: DEFAULT_SPLIT_FRACTION,
            model_variants: vec![ModelVariant::Linear, ModelVariant::Tree],
            class_balance: true,
            random_seed: DEFAULT_RANDOM_SEED,
            tree_max_depth: DEFAULT_TREE_MAX_DEPTH,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with the schema's target-encoding columns
    /// pre-excluded, so a run over a declared schema passes the leakage
    /// check without hand-writing the exclusion list.
    pub fn for_schema(schema: &TableSchema) -> Self {
        let mut config = Self::default();
        config.features.excluded_columns = schema
            .target_encoding_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        config
    }

    fn training(&self) -> TrainingConfig {
        TrainingConfig {
            model_variants: self.model_variants.clone(),
            class_balance: self.class_balance,
            random_seed: self.random_seed,
            tree_max_depth: self.tree_max_depth,
        }
    }
}

/// Identifies the run that produced a serialized output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProvenance {
    pub producer: String,
    pub version: String,
    pub run_id: Uuid,
    pub computed_at_utc: DateTime<Utc>,
}

impl RunProvenance {
    fn capture() -> Self {
        Self {
            producer: crate::PRODUCER_NAME.to_string(),
            version: crate::HABITCAST_VERSION.to_string(),
            run_id: Uuid::new_v4(),
            computed_at_utc: Utc::now(),
        }
    }
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub provenance: RunProvenance,
    pub aligned: AlignedTable,
    pub features: FeatureTable,
    /// One report per configured variant, in configuration order
    pub reports: Vec<EvaluationReport>,
}

impl PipelineRun {
    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the full pipeline over raw source tables.
pub fn run_pipeline(
    sources: &[SourceTable],
    schema: &TableSchema,
    config: &PipelineConfig,
) -> Result<PipelineRun, PipelineError> {
    let provenance = RunProvenance::capture();
    log::info!("pipeline run {} starting", provenance.run_id);

    let aligned = DataAligner::align(sources, schema)?;
    let features = FeatureBuilder::build(&aligned, schema, &config.features)?;
    let (train, test) = Splitter::split(&features, config.split_fraction)?;
    let artifacts = ModelTrainer::train(&train, &config.training())?;

    let mut reports = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        reports.push(Evaluator::evaluate(artifact, &test)?);
    }

    log::info!(
        "pipeline run {} finished: {} reports over {} test rows",
        provenance.run_id,
        reports.len(),
        test.len()
    );

    Ok(PipelineRun {
        provenance,
        aligned,
        features,
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DailyObservation;
    use chrono::{Days, NaiveDate};

    /// One synthetic year across three sources. Short sleep and alcohol
    /// purchases precede cigarette purchase days, so the signal is
    /// learnable; spend columns mirror the same-day target to exercise the
    /// leakage exclusion.
    fn synthetic_year(n_days: usize) -> Vec<SourceTable> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let buys = |i: usize| (i + 1) % 5 == 0;

        let mut wearable = Vec::new();
        let mut social = Vec::new();
        let mut purchases = Vec::new();
        for i in 0..n_days {
            let d = start + Days::new(i as u64);
            // day before a purchase: short sleep, drinking
            let restless = buys(i + 1);
            wearable.push(
                DailyObservation::new(d)
                    .with("sleep_hours", if restless { 4.5 } else { 7.8 })
                    .with("steps", 6000.0 + (i % 10) as f64 * 300.0)
                    .with("avg_heart_rate", if restless { 82.0 } else { 64.0 }),
            );
            social.push(
                DailyObservation::new(d)
                    .with("avg_compound", if restless { -0.4 } else { 0.3 })
                    .with("tweets_count", (i % 7) as f64),
            );
            purchases.push(
                DailyObservation::new(d)
                    .with("alcohol_purchase_day", if restless { 1.0 } else { 0.0 })
                    .with("total_spend", if buys(i) { 14.0 } else { 3.0 })
                    .with("cigarette_purchase_day", if buys(i) { 1.0 } else { 0.0 }),
            );
        }

        vec![
            SourceTable::new("wearable", wearable),
            SourceTable::new("social", social),
            SourceTable::new("purchases", purchases),
        ]
    }

    fn year_schema() -> TableSchema {
        use crate::schema::{ColumnSpec, ImputeStrategy::*, SignalDomain::*};
        TableSchema::new(
            vec![
                ColumnSpec::new("avg_compound", Emotional, ForwardFill),
                ColumnSpec::new("tweets_count", Emotional, ZeroFill),
                ColumnSpec::new("sleep_hours", Physiological, ForwardFill),
                ColumnSpec::new("steps", Physiological, ZeroFill),
                ColumnSpec::new("avg_heart_rate", Physiological, ForwardFill),
                ColumnSpec::new("alcohol_purchase_day", BehavioralFlag, ZeroFill),
                ColumnSpec::new("total_spend", Financial, ZeroFill).encoding_target(),
                ColumnSpec::new("cigarette_purchase_day", Target, ZeroFill),
            ],
            "cigarette_purchase_day",
        )
    }

    #[test]
    fn test_full_year_run() {
        let sources = synthetic_year(365);
        let schema = year_schema();
        let config = PipelineConfig::for_schema(&schema);

        let run = run_pipeline(&sources, &schema, &config).unwrap();

        // 365 aligned days pair into 364 supervised rows, split 291/73
        assert_eq!(run.aligned.len(), 365);
        assert_eq!(run.features.len(), 364);
        assert_eq!(run.reports.len(), 2);

        for report in &run.reports {
            assert_eq!(report.confusion.total(), 73);
            // The synthetic signal is strong; both variants must rank well
            assert!(report.roc_auc > 0.9, "auc {} too low", report.roc_auc);
        }
    }

    #[test]
    fn test_leaky_spend_column_never_reaches_predictors() {
        let sources = synthetic_year(365);
        let schema = year_schema();
        let config = PipelineConfig::for_schema(&schema);

        let run = run_pipeline(&sources, &schema, &config).unwrap();
        assert!(!run
            .features
            .feature_names
            .contains(&"total_spend".to_string()));
        assert!(!run
            .features
            .feature_names
            .contains(&"cigarette_purchase_day".to_string()));
    }

    #[test]
    fn test_default_config_rejects_declared_leak() {
        // Without the exclusion list the structural leakage check fires
        let sources = synthetic_year(365);
        let schema = year_schema();
        let config = PipelineConfig::default();

        let err = run_pipeline(&sources, &schema, &config).unwrap_err();
        assert!(matches!(err, PipelineError::LeakageConfiguration(_)));
    }

    #[test]
    fn test_reports_follow_variant_order() {
        let sources = synthetic_year(200);
        let schema = year_schema();
        let mut config = PipelineConfig::for_schema(&schema);
        config.model_variants = vec![ModelVariant::Tree, ModelVariant::Linear];

        let run = run_pipeline(&sources, &schema, &config).unwrap();
        assert_eq!(run.reports[0].variant, ModelVariant::Tree);
        assert_eq!(run.reports[1].variant, ModelVariant::Linear);
    }

    #[test]
    fn test_run_serializes_to_json() {
        let sources = synthetic_year(120);
        let schema = year_schema();
        let config = PipelineConfig::for_schema(&schema);

        let run = run_pipeline(&sources, &schema, &config).unwrap();
        let json = run.to_json().unwrap();
        assert!(json.contains("\"run_id\""));
        assert!(json.contains("\"roc_auc\""));
    }

    #[test]
    fn test_too_short_history_rejected() {
        let sources = synthetic_year(20);
        let schema = year_schema();
        let config = PipelineConfig::for_schema(&schema);

        let err = run_pipeline(&sources, &schema, &config).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }
}

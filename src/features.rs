//! Supervised feature construction
//!
//! This module turns the aligned daily table into a leakage-safe supervised
//! table:
//! - predictors come from day *i*, the label from day *i+1*'s raw target
//! - per-column lag-1 shift and trailing rolling means where configured
//! - structural exclusion of columns declared to encode the target

use crate::error::PipelineError;
use crate::schema::TableSchema;
use crate::types::{AlignedTable, FeatureTable};
use ndarray::{Array1, Array2};
use std::collections::{BTreeMap, BTreeSet};

/// Per-run feature transform configuration
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FeatureConfig {
    /// Columns whose predictor value is shifted back one additional day
    /// (day *i-1* instead of day *i*)
    #[serde(default)]
    pub lag_columns: BTreeSet<String>,
    /// Columns replaced by a trailing rolling mean, column -> window size
    /// in days (window ends at the predictor day, never later)
    #[serde(default)]
    pub rolling_columns: BTreeMap<String, usize>,
    /// Columns dropped from the predictor set entirely
    #[serde(default)]
    pub excluded_columns: BTreeSet<String>,
}

/// Builder for the supervised feature table
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Build the feature table from an aligned table.
    ///
    /// The predictor column order follows the aligned table's column order
    /// with the target and excluded columns removed, so it is stable across
    /// runs given the same configuration. The last day yields no row.
    pub fn build(
        aligned: &AlignedTable,
        schema: &TableSchema,
        config: &FeatureConfig,
    ) -> Result<FeatureTable, PipelineError> {
        let target_idx =
            aligned
                .column_index(&schema.target)
                .ok_or_else(|| PipelineError::ColumnNotFound {
                    column: schema.target.clone(),
                    context: "target column missing from aligned table".to_string(),
                })?;

        validate_config_columns(aligned, config)?;
        validate_leakage(schema, config)?;

        let predictor_names: Vec<String> = aligned
            .columns
            .iter()
            .filter(|name| {
                **name != schema.target && !config.excluded_columns.contains(name.as_str())
            })
            .cloned()
            .collect();
        let predictor_indices: Vec<usize> = predictor_names
            .iter()
            .map(|name| aligned.column_index(name).unwrap_or(usize::MAX))
            .collect();

        let n_days = aligned.len();
        let n_rows = n_days.saturating_sub(1);
        let mut x = Array2::<f64>::zeros((n_rows, predictor_names.len()));
        let mut y = Array1::<f64>::zeros(n_rows);

        for i in 0..n_rows {
            // Lagged columns look one day further back; day 0 has no earlier
            // day and falls back to its own value.
            for (c, name) in predictor_names.iter().enumerate() {
                let col = predictor_indices[c];
                let day = if config.lag_columns.contains(name) && i > 0 {
                    i - 1
                } else {
                    i
                };
                x[[i, c]] = match config.rolling_columns.get(name) {
                    Some(&window) => trailing_mean(aligned, col, day, window),
                    None => aligned.values[day][col],
                };
            }
            // Label from the following day's raw target indicator
            y[i] = aligned.values[i + 1][target_idx];
        }

        log::info!(
            "built feature table: {} rows x {} predictors from {} aligned days",
            n_rows,
            predictor_names.len(),
            n_days
        );

        Ok(FeatureTable {
            feature_names: predictor_names,
            feature_dates: aligned.dates[..n_rows].to_vec(),
            label_dates: aligned.dates[1..].to_vec(),
            x,
            y,
        })
    }
}

/// Mean of the column over the `window` days ending at `day` (fewer at the
/// start of the table)
fn trailing_mean(aligned: &AlignedTable, col: usize, day: usize, window: usize) -> f64 {
    let window = window.max(1);
    let start = (day + 1).saturating_sub(window);
    let span = &aligned.values[start..=day];
    span.iter().map(|row| row[col]).sum::<f64>() / span.len() as f64
}

/// Every configured column must exist in the aligned table
fn validate_config_columns(
    aligned: &AlignedTable,
    config: &FeatureConfig,
) -> Result<(), PipelineError> {
    let configured = config
        .lag_columns
        .iter()
        .chain(config.rolling_columns.keys())
        .chain(config.excluded_columns.iter());

    for name in configured {
        if aligned.column_index(name).is_none() {
            return Err(PipelineError::ColumnNotFound {
                column: name.clone(),
                context: "referenced by feature configuration".to_string(),
            });
        }
    }
    Ok(())
}

/// Reject any configuration that would let target-encoding data reach the
/// predictor set. This check is structural: it reads the schema's declared
/// lineage flags, not column-name conventions.
fn validate_leakage(schema: &TableSchema, config: &FeatureConfig) -> Result<(), PipelineError> {
    if config.lag_columns.contains(&schema.target)
        || config.rolling_columns.contains_key(&schema.target)
    {
        return Err(PipelineError::LeakageConfiguration(format!(
            "target column '{}' cannot be configured as a predictor transform",
            schema.target
        )));
    }

    for name in schema.target_encoding_columns() {
        if config.lag_columns.contains(name) || config.rolling_columns.contains_key(name) {
            return Err(PipelineError::LeakageConfiguration(format!(
                "column '{name}' is declared to encode the target but is configured as a predictor"
            )));
        }
        if !config.excluded_columns.contains(name) {
            return Err(PipelineError::LeakageConfiguration(format!(
                "column '{name}' is declared to encode the target and must be in the excluded set"
            )));
        }
    }
    Ok(())
}

//! Source alignment
//!
//! This module merges per-source daily tables into one chronologically
//! ordered table:
//! - union of dates across all sources
//! - duplicate-date and empty-source validation
//! - per-column deterministic imputation per the declared schema strategy

use crate::error::PipelineError;
use crate::schema::{ImputeStrategy, TableSchema};
use crate::types::{AlignedTable, SourceTable};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Aligner for merging source tables into one daily table
pub struct DataAligner;

impl DataAligner {
    /// Align source tables over the union of their dates.
    ///
    /// Column order is the schema's declared order followed by pass-through
    /// columns (those observed but not declared) in lexicographic order, so
    /// the output ordering is stable across runs.
    pub fn align(
        sources: &[SourceTable],
        schema: &TableSchema,
    ) -> Result<AlignedTable, PipelineError> {
        if sources.is_empty() {
            return Err(PipelineError::EmptyInput("no source tables given".to_string()));
        }

        for source in sources {
            if source.observations.is_empty() {
                return Err(PipelineError::EmptyInput(format!(
                    "source table '{}' has no observations",
                    source.source
                )));
            }
            let mut seen = BTreeSet::new();
            for obs in &source.observations {
                if !seen.insert(obs.date) {
                    return Err(PipelineError::SourceMisalignment {
                        source_name: source.source.clone(),
                        date: obs.date,
                    });
                }
            }
        }

        let dates: Vec<NaiveDate> = sources
            .iter()
            .flat_map(|s| s.observations.iter().map(|o| o.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = column_order(sources, schema);
        let column_index: BTreeMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let date_index: BTreeMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();

        // Raw grid with missing cells still explicit
        let mut grid: Vec<Vec<Option<f64>>> = vec![vec![None; columns.len()]; dates.len()];
        for source in sources {
            for obs in &source.observations {
                let row = date_index[&obs.date];
                for (name, value) in &obs.values {
                    if let (Some(&col), Some(v)) = (column_index.get(name.as_str()), value) {
                        grid[row][col] = Some(*v);
                    }
                }
            }
        }

        let mut imputed_counts = BTreeMap::new();
        let mut values = vec![vec![0.0; columns.len()]; dates.len()];
        for (col, name) in columns.iter().enumerate() {
            // Undeclared pass-through columns forward-fill: they are signals
            // we know nothing about, so carrying the last observation is the
            // least surprising choice.
            let strategy = schema
                .column(name)
                .map(|c| c.impute)
                .unwrap_or(ImputeStrategy::ForwardFill);

            let raw: Vec<Option<f64>> = grid.iter().map(|row| row[col]).collect();
            let (filled, imputed) = impute_column(&raw, strategy);
            if imputed > 0 {
                log::debug!("imputed {imputed} cells in column '{name}' via {strategy:?}");
            }
            imputed_counts.insert(name.clone(), imputed);
            for (row, v) in filled.into_iter().enumerate() {
                values[row][col] = v;
            }
        }

        log::info!(
            "aligned {} sources into {} days x {} columns",
            sources.len(),
            dates.len(),
            columns.len()
        );

        Ok(AlignedTable {
            dates,
            columns,
            values,
            imputed_counts,
        })
    }
}

/// Schema columns in declared order, then observed-but-undeclared columns
/// in lexicographic order
fn column_order(sources: &[SourceTable], schema: &TableSchema) -> Vec<String> {
    let mut columns: Vec<String> = schema.columns.iter().map(|c| c.name.clone()).collect();
    let declared: BTreeSet<&str> = columns.iter().map(|c| c.as_str()).collect();

    let extra: BTreeSet<String> = sources
        .iter()
        .flat_map(|s| s.observations.iter())
        .flat_map(|o| o.values.keys())
        .filter(|name| !declared.contains(name.as_str()))
        .cloned()
        .collect();

    columns.extend(extra);
    columns
}

/// Fill one column's missing cells, returning the filled values and the
/// number of cells imputed
fn impute_column(raw: &[Option<f64>], strategy: ImputeStrategy) -> (Vec<f64>, usize) {
    let mut imputed = 0;
    let filled = match strategy {
        ImputeStrategy::ZeroFill => raw
            .iter()
            .map(|cell| {
                cell.unwrap_or_else(|| {
                    imputed += 1;
                    0.0
                })
            })
            .collect(),
        ImputeStrategy::ForwardFill => {
            // Leading gaps take the first observed value; a column with no
            // observations at all falls back to zero.
            let first_observed = raw.iter().flatten().next().copied().unwrap_or(0.0);
            let mut last = first_observed;
            raw.iter()
                .map(|cell| match cell {
                    Some(v) => {
                        last = *v;
                        *v
                    }
                    None => {
                        imputed += 1;
                        last
                    }
                })
                .collect()
        }
    };
    (filled, imputed)
}

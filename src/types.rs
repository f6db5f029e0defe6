//! Core data products for the habitcast pipeline
//!
//! This module defines the tables that flow through each stage: raw
//! per-source observations, the aligned daily table, and the supervised
//! feature table. Every product is immutable once produced and handed by
//! value to the next stage.

use chrono::NaiveDate;
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One calendar day of values from a single source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    /// Column name -> observed value; `None` marks an explicitly missing cell
    pub values: BTreeMap<String, Option<f64>>,
}

impl DailyObservation {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style helper for assembling observations
    pub fn with(mut self, column: &str, value: f64) -> Self {
        self.values.insert(column.to_string(), Some(value));
        self
    }

    /// Record a column as present but missing for this day
    pub fn with_missing(mut self, column: &str) -> Self {
        self.values.insert(column.to_string(), None);
        self
    }
}

/// A per-source daily table, keyed uniquely by date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTable {
    pub source: String,
    pub observations: Vec<DailyObservation>,
}

impl SourceTable {
    pub fn new(source: &str, observations: Vec<DailyObservation>) -> Self {
        Self {
            source: source.to_string(),
            observations,
        }
    }
}

/// Chronologically ordered daily table with every column present for every
/// date and missing cells imputed per the declared schema strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedTable {
    /// Dates ascending, one row each
    pub dates: Vec<NaiveDate>,
    /// Column order: schema order first, then pass-through columns
    pub columns: Vec<String>,
    /// Row-major cells, rows parallel to `dates`, cells parallel to `columns`
    pub values: Vec<Vec<f64>>,
    /// Number of imputed cells per column, for quality reporting
    pub imputed_counts: BTreeMap<String, usize>,
}

impl AlignedTable {
    /// Number of days in the table
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column in date order
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.values.iter().map(|row| row[idx]).collect())
    }
}

/// Supervised table: predictors observed on day *i*, label taken from day
/// *i+1*'s raw target indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    /// Predictor column names, stable order across runs
    pub feature_names: Vec<String>,
    /// Day the predictors were observed (day *i*)
    pub feature_dates: Vec<NaiveDate>,
    /// Day the label refers to (day *i+1*)
    pub label_dates: Vec<NaiveDate>,
    /// Predictor matrix, one row per feature date
    pub x: Array2<f64>,
    /// Binary labels (0.0 / 1.0), parallel to rows of `x`
    pub y: Array1<f64>,
}

impl FeatureTable {
    /// Number of supervised rows
    pub fn len(&self) -> usize {
        self.label_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label_dates.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of positive-label rows
    pub fn positive_count(&self) -> usize {
        self.y.iter().filter(|&&v| v >= 0.5).count()
    }

    /// Copy of the rows in `[start, end)`, preserving order and names
    pub fn slice_rows(&self, start: usize, end: usize) -> FeatureTable {
        FeatureTable {
            feature_names: self.feature_names.clone(),
            feature_dates: self.feature_dates[start..end].to_vec(),
            label_dates: self.label_dates[start..end].to_vec(),
            x: self.x.slice(s![start..end, ..]).to_owned(),
            y: self.y.slice(s![start..end]).to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn make_feature_table(n: usize) -> FeatureTable {
        let feature_dates: Vec<NaiveDate> = (0..n).map(|i| date(i as u32 + 1)).collect();
        let label_dates: Vec<NaiveDate> = (0..n).map(|i| date(i as u32 + 2)).collect();
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| if i % 3 == 0 { 1.0 } else { 0.0 });

        FeatureTable {
            feature_names: vec!["sleep_hours".to_string(), "steps".to_string()],
            feature_dates,
            label_dates,
            x,
            y,
        }
    }

    #[test]
    fn test_slice_rows_preserves_order() {
        let table = make_feature_table(10);
        let slice = table.slice_rows(3, 7);

        assert_eq!(slice.len(), 4);
        assert_eq!(slice.feature_names, table.feature_names);
        assert_eq!(slice.feature_dates[0], date(4));
        assert_eq!(slice.x[[0, 0]], 6.0);
        assert_eq!(slice.y[0], 1.0); // row 3 of the source
    }

    #[test]
    fn test_positive_count() {
        let table = make_feature_table(9);
        // rows 0, 3, 6 are positive
        assert_eq!(table.positive_count(), 3);
    }

    #[test]
    fn test_aligned_column_lookup() {
        let table = AlignedTable {
            dates: vec![date(1), date(2)],
            columns: vec!["sleep_hours".to_string(), "steps".to_string()],
            values: vec![vec![7.5, 8000.0], vec![6.0, 5000.0]],
            imputed_counts: BTreeMap::new(),
        };

        assert_eq!(table.column_index("steps"), Some(1));
        assert_eq!(table.column_values("steps"), Some(vec![8000.0, 5000.0]));
        assert_eq!(table.column_values("missing"), None);
    }
}

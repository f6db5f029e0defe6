//! Chronological train/test splitting
//!
//! The split point is a row index in date order, never a shuffle: every
//! training date strictly precedes every test date.

use crate::error::PipelineError;
use crate::types::FeatureTable;

/// Default share of rows assigned to the train segment
pub const DEFAULT_SPLIT_FRACTION: f64 = 0.8;

/// Minimum usable rows per segment; below this, metrics are noise
pub const MIN_SEGMENT_ROWS: usize = 10;

/// Chronological splitter
pub struct Splitter;

impl Splitter {
    /// Split into (train, test): train is the first ⌊fraction·len⌋ rows.
    pub fn split(
        features: &FeatureTable,
        fraction: f64,
    ) -> Result<(FeatureTable, FeatureTable), PipelineError> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(PipelineError::InsufficientData(format!(
                "split fraction {fraction} is outside (0, 1)"
            )));
        }

        let n = features.len();
        let split_idx = (fraction * n as f64).floor() as usize;
        let train = features.slice_rows(0, split_idx);
        let test = features.slice_rows(split_idx, n);

        if train.len() < MIN_SEGMENT_ROWS || test.len() < MIN_SEGMENT_ROWS {
            return Err(PipelineError::InsufficientData(format!(
                "train has {} rows and test has {} rows; both need at least {}",
                train.len(),
                test.len(),
                MIN_SEGMENT_ROWS
            )));
        }

        let test_positives = test.positive_count();
        if test_positives == 0 || test_positives == test.len() {
            return Err(PipelineError::InsufficientData(format!(
                "test segment holds a single label class ({} of {} rows positive); \
                 evaluation would be degenerate",
                test_positives,
                test.len()
            )));
        }

        log::info!(
            "chronological split: {} train rows / {} test rows (boundary at {})",
            train.len(),
            test.len(),
            test.label_dates[0]
        );

        Ok((train, test))
    }
}

//! Column schema declarations
//!
//! The aligner and feature builder operate on a declared schema rather than
//! inferring behavior from column names:
//! - each column carries its source domain and imputation strategy
//! - target lineage is an explicit `encodes_target` flag, never a
//!   name-matching heuristic

use serde::{Deserialize, Serialize};

/// Source domain a column belongs to, for provenance and display grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDomain {
    /// Transaction amounts, categories, visit counts
    Financial,
    /// Sentiment, tweet volume, music valence
    Emotional,
    /// Sleep, steps, heart rate
    Physiological,
    /// Binary daily indicators (alcohol purchase, patch use)
    BehavioralFlag,
    /// The raw same-day outcome indicator
    Target,
}

/// Deterministic imputation strategy for missing cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Carry the last observed value forward; leading gaps take the first
    /// observed value. Suited to slowly-changing signals.
    ForwardFill,
    /// Write 0.0. Suited to count-like and flag columns where absence means
    /// "nothing happened".
    ZeroFill,
}

/// Declared handling and lineage for one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub domain: SignalDomain,
    pub impute: ImputeStrategy,
    /// True when the column's value can directly reconstruct the target
    /// outcome (e.g. a spend amount when the target is a purchase event).
    /// Such columns must never reach the predictor set.
    #[serde(default)]
    pub encodes_target: bool,
}

impl ColumnSpec {
    pub fn new(name: &str, domain: SignalDomain, impute: ImputeStrategy) -> Self {
        Self {
            name: name.to_string(),
            domain,
            impute,
            encodes_target: false,
        }
    }

    /// Mark the column as capable of reconstructing the target
    pub fn encoding_target(mut self) -> Self {
        self.encodes_target = true;
        self
    }
}

/// Declared schema for the aligned daily table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnSpec>,
    /// Name of the raw same-day target indicator column
    pub target: String,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSpec>, target: &str) -> Self {
        Self {
            columns,
            target: target.to_string(),
        }
    }

    /// Look up a column spec by name
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns declared as encoding the target (must be excluded from
    /// the predictor set)
    pub fn target_encoding_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.encodes_target)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Schema for the single-subject daily record this pipeline was built
    /// around: one year of financial, emotional, physiological, and
    /// behavioral-flag signals with a same-day cigarette purchase target.
    ///
    /// All spend/visit columns are flagged `encodes_target` because the
    /// target is itself a purchase event reconstructable from transaction
    /// amount and category.
    pub fn subject_default() -> Self {
        use ImputeStrategy::{ForwardFill, ZeroFill};
        use SignalDomain::*;

        let columns = vec![
            // Emotional / cultural
            ColumnSpec::new("avg_compound", Emotional, ForwardFill),
            ColumnSpec::new("tweets_count", Emotional, ZeroFill),
            ColumnSpec::new("avg_valence", Emotional, ForwardFill),
            ColumnSpec::new("avg_happy_tracks", Emotional, ForwardFill),
            ColumnSpec::new("avg_sad_tracks", Emotional, ForwardFill),
            // Physiological
            ColumnSpec::new("sleep_hours", Physiological, ForwardFill),
            ColumnSpec::new("steps", Physiological, ZeroFill),
            ColumnSpec::new("avg_heart_rate", Physiological, ForwardFill),
            // Behavioral flags
            ColumnSpec::new("alcohol_purchase_day", BehavioralFlag, ZeroFill),
            ColumnSpec::new("nicotine_patch_day", BehavioralFlag, ZeroFill),
            // Financial columns can reconstruct the purchase target
            ColumnSpec::new("cc_spend_convenience", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("cc_spend_food_out", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("cc_spend_leisure", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("cc_spend_medical", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("cc_spend_nightlife", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("cc_spend_other", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("cc_spend_shopping", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("visits", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("total_spend", Financial, ZeroFill).encoding_target(),
            ColumnSpec::new("avg_spend_per_visit", Financial, ZeroFill).encoding_target(),
            // Target
            ColumnSpec::new("cigarette_purchase_day", Target, ZeroFill),
        ];

        Self::new(columns, "cigarette_purchase_day")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_default_target_present() {
        let schema = TableSchema::subject_default();
        assert!(schema.column("cigarette_purchase_day").is_some());
        assert_eq!(schema.target, "cigarette_purchase_day");
    }

    #[test]
    fn test_target_encoding_columns_are_financial() {
        let schema = TableSchema::subject_default();
        let leaky = schema.target_encoding_columns();

        assert!(leaky.contains(&"total_spend"));
        assert!(leaky.contains(&"cc_spend_convenience"));
        // Physiological signals carry no purchase information
        assert!(!leaky.contains(&"sleep_hours"));
    }

    #[test]
    fn test_column_lookup() {
        let schema = TableSchema::subject_default();
        let spec = schema.column("steps").unwrap();
        assert_eq!(spec.domain, SignalDomain::Physiological);
        assert_eq!(spec.impute, ImputeStrategy::ZeroFill);
        assert!(!spec.encodes_target);
    }
}

//! Classification metrics
//!
//! Confusion-matrix metrics at a fixed decision threshold plus ROC-AUC
//! computed across all thresholds from the probability scores.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Count outcomes from true labels and hard predictions (both 0/1
    /// encoded as floats, thresholded at 0.5)
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut cm = Self {
            true_positives: 0,
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
        };

        for (&actual, &predicted) in y_true.iter().zip(y_pred.iter()) {
            match (actual >= 0.5, predicted >= 0.5) {
                (true, true) => cm.true_positives += 1,
                (false, false) => cm.true_negatives += 1,
                (false, true) => cm.false_positives += 1,
                (true, false) => cm.false_negatives += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f64 / total as f64
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r < f64::EPSILON {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// ROC-AUC from positive-class probability scores.
///
/// Trapezoid rule over the ROC curve with tied scores grouped, equivalent to
/// the Mann-Whitney U statistic. Returns 0.5 when the labels hold a single
/// class (no ranking is possible).
pub fn roc_auc(y_true: &Array1<f64>, y_score: &Array1<f64>) -> f64 {
    let mut pairs: Vec<(f64, bool)> = y_score
        .iter()
        .zip(y_true.iter())
        .map(|(&score, &label)| (score, label >= 0.5))
        .collect();
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let n_pos = pairs.iter().filter(|(_, positive)| *positive).count() as f64;
    let n_neg = pairs.len() as f64 - n_pos;
    if n_pos < 0.5 || n_neg < 0.5 {
        return 0.5;
    }

    let mut auc = 0.0;
    let mut tp = 0.0;
    let mut fp = 0.0;
    let (mut tpr_prev, mut fpr_prev) = (0.0, 0.0);

    let mut i = 0;
    while i < pairs.len() {
        // Advance over the whole tied-score group at once
        let score = pairs[i].0;
        let mut j = i;
        while j < pairs.len() && (pairs[j].0 - score).abs() < 1e-12 {
            if pairs[j].1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            j += 1;
        }

        let tpr = tp / n_pos;
        let fpr = fp / n_neg;
        auc += (fpr - fpr_prev) * (tpr + tpr_prev) / 2.0;
        tpr_prev = tpr;
        fpr_prev = fpr;
        i = j;
    }

    auc
}

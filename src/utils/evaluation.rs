use serde::{Deserialize, Serialize};

use crate::error::{OutlierError, Result};

/// Binary classification metrics of predicted outlier labels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Unweighted mean of the inlier and outlier F1 scores.
    pub f1_macro: f64,
}

#[derive(Default)]
struct Confusion {
    tp: f64,
    fp: f64,
    fn_count: f64,
    tn: f64,
}

// precision, recall and F1 for the positive class of a confusion table
fn class_scores(tp: f64, fp: f64, fn_count: f64) -> (f64, f64, f64) {
    let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
    let recall = if tp + fn_count > 0.0 { tp / (tp + fn_count) } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (precision, recall, f1)
}

/// Score `predicted` outlier labels (1 = outlier) against `truth`.
///
/// Used to rank detector configurations against labelled data.
pub fn evaluate_labels(truth: &[u8], predicted: &[u8]) -> Result<LabelMetrics> {
    if truth.len() != predicted.len() {
        return Err(OutlierError::DimensionMismatch {
            context: "label vectors",
            expected: truth.len(),
            got: predicted.len(),
        });
    }

    let mut c = Confusion::default();
    for (&label, &pred) in truth.iter().zip(predicted.iter()) {
        match (label > 0, pred > 0) {
            (true, true) => c.tp += 1.0,
            (false, true) => c.fp += 1.0,
            (true, false) => c.fn_count += 1.0,
            (false, false) => c.tn += 1.0,
        }
    }

    let (precision, recall, f1) = class_scores(c.tp, c.fp, c.fn_count);
    // inliers as the positive class
    let (_, _, f1_inlier) = class_scores(c.tn, c.fn_count, c.fp);

    Ok(LabelMetrics {
        precision,
        recall,
        f1,
        f1_macro: (f1 + f1_inlier) / 2.0,
    })
}

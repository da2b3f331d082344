//! Evaluation metrics and epoch-end aggregation
//!
//! - Binary classification: accuracy, precision, recall, F1 over
//!   thresholded predictions
//! - Multi-class: confusion matrix, per-class precision/recall/F1 with
//!   macro/weighted averaging, sklearn-style report
//! - Epoch aggregation: logit concatenation, sigmoid thresholding, argmax
//!   flattening, sentinel-label masking

mod aggregate;
mod classification;

pub use aggregate::{
    argmax_rows, filter_sentinel, sentinel_mask, sigmoid_threshold, targets_to_int, IGNORE_INDEX,
};
pub use classification::{
    accuracy, binary_f1, binary_precision, binary_recall, classification_report, weighted_f1,
    Average, ConfusionMatrix, MultiClassMetrics,
};

//! Loss functions for classification fine-tuning
//!
//! - [`BceWithLogitsLoss`] - binary classification with built-in sigmoid
//! - [`WeightedCrossEntropyLoss`] - multi-class with fixed class weights

mod bce_with_logits;
mod traits;
mod weighted_ce;

pub use bce_with_logits::BceWithLogitsLoss;
pub use traits::LossFn;
pub use weighted_ce::WeightedCrossEntropyLoss;

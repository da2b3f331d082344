//! Task modules: lifecycle contract and epoch accumulation
//!
//! A task module binds a pretrained backbone to a loss function, per-batch
//! step logic, and optimizer configuration. The external trainer drives the
//! lifecycle in a fixed order:
//!
//! ```text
//! Init → {Training ↔ Validation}* → optional Test → Teardown
//! ```
//!
//! with each epoch consisting of N × `step` calls followed by one
//! `epoch_end` call over the buffered step outputs. The trainer owns the
//! [`EpochBuffer`]: it creates one per epoch, pushes every [`StepOutput`]
//! into it, and hands it to `epoch_end` for consumption.

mod auto;
mod binary;
mod config;
mod token;

pub use auto::{AutoSequenceTask, CLASS_WEIGHTS};
pub use binary::BinarySequenceTask;
pub use config::TaskConfig;
pub use token::{TokenClassificationTask, NUM_TOKEN_LABELS};

use crate::logging::MetricSink;
use crate::optim::AdamW;
use crate::{Error, Result, Tensor};
use ndarray::Array1;

/// Output of a single step over one batch
#[derive(Debug)]
pub struct StepOutput {
    /// Scalar loss, present on training steps (the trainer backpropagates it)
    pub loss: Option<Tensor>,
    /// Raw logits for the batch, flattened
    pub logits: Tensor,
    /// Ground-truth targets for the batch, as floats
    pub true_preds: Array1<f32>,
}

/// Accuracy and F1 computed at an epoch boundary
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochScores {
    /// Fraction of correct predictions
    pub accuracy: f64,
    /// F1 score (binary or weighted-average, per task)
    pub f1: f64,
}

/// All step outputs of one epoch, in batch arrival order
///
/// Created empty at epoch start, populated by each step, consumed and
/// discarded at epoch end. Single-writer: the trainer owns it and never
/// shares it across concurrent epochs.
#[derive(Default)]
pub struct EpochBuffer {
    outputs: Vec<StepOutput>,
}

impl EpochBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step's output
    pub fn push(&mut self, output: StepOutput) {
        self.outputs.push(output);
    }

    /// Number of buffered steps
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether no steps have been buffered
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Concatenate all buffered logits in arrival order
    pub fn concat_logits(&self) -> Array1<f32> {
        let mut all = Vec::new();
        for out in &self.outputs {
            all.extend(out.logits.to_vec());
        }
        Array1::from(all)
    }

    /// Concatenate all buffered targets in arrival order
    pub fn concat_true_preds(&self) -> Array1<f32> {
        let mut all = Vec::new();
        for out in &self.outputs {
            all.extend(out.true_preds.iter().copied());
        }
        Array1::from(all)
    }
}

/// Lifecycle contract shared by the three task variants
///
/// All hooks are invoked synchronously by the external trainer; nothing
/// here blocks, suspends, or synchronizes. Variants that lack a test phase
/// keep the default `Unsupported` implementations.
pub trait TaskModule {
    /// Batch type this task consumes
    type Batch;

    /// One training step: forward, loss, per-step logging
    fn training_step(&self, batch: &Self::Batch, sink: &mut dyn MetricSink)
        -> Result<StepOutput>;

    /// One validation step: forward, per-epoch loss logging
    fn validation_step(&self, batch: &Self::Batch, sink: &mut dyn MetricSink)
        -> Result<StepOutput>;

    /// One test step
    fn test_step(&self, _batch: &Self::Batch, _sink: &mut dyn MetricSink) -> Result<StepOutput> {
        Err(Error::Unsupported("test step not implemented for this task"))
    }

    /// Build the optimizer with backbone/head parameter groups
    fn configure_optimizers(&self) -> Result<AdamW>;

    /// Aggregate metrics over a finished training epoch
    fn train_epoch_end(&self, outputs: EpochBuffer, sink: &mut dyn MetricSink)
        -> Result<EpochScores>;

    /// Aggregate metrics over a finished validation epoch
    fn validation_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores>;

    /// Aggregate metrics over a finished test epoch
    fn test_epoch_end(
        &self,
        _outputs: EpochBuffer,
        _sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        Err(Error::Unsupported("test epoch end not implemented for this task"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(logits: Vec<f32>, truth: Vec<f32>) -> StepOutput {
        StepOutput {
            loss: None,
            logits: Tensor::from_vec(logits, false),
            true_preds: Array1::from(truth),
        }
    }

    #[test]
    fn test_buffer_preserves_arrival_order() {
        let mut buffer = EpochBuffer::new();
        buffer.push(step(vec![1.0, 2.0], vec![1.0]));
        buffer.push(step(vec![3.0], vec![0.0]));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.concat_logits().to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(buffer.concat_true_preds().to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = EpochBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.concat_logits().len(), 0);
    }
}

//! Binary sequence classification task

use super::{EpochBuffer, EpochScores, StepOutput, TaskConfig, TaskModule};
use crate::autograd::Context;
use crate::backbone::{Encoder, ModelRepository, PooledClassifier};
use crate::batch::SequenceBatch;
use crate::logging::{LogFlags, MetricSink};
use crate::loss::{BceWithLogitsLoss, LossFn};
use crate::metrics::{accuracy, binary_f1, sigmoid_threshold, targets_to_int};
use crate::optim::{AdamW, ParamGroup};
use crate::{Result, Tensor};
use std::cell::RefCell;

/// Single-label binary sequence classification
///
/// Wraps a pretrained encoder with a dropout + single-logit head, trains
/// under BCE-with-logits, and aggregates accuracy and binary F1 at epoch
/// boundaries. The encoder fine-tunes at `base_lr`; the head trains at
/// `linear_lr`.
pub struct BinarySequenceTask {
    model: PooledClassifier,
    config: TaskConfig,
    // Train/eval mode for dropout; flipped by the step hooks
    ctx: RefCell<Context>,
}

impl BinarySequenceTask {
    /// Bind an already-loaded encoder to a fresh head
    pub fn new(config: TaskConfig, encoder: Box<dyn Encoder>) -> Self {
        Self {
            model: PooledClassifier::new(encoder),
            config,
            ctx: RefCell::new(Context::new()),
        }
    }

    /// Load the encoder named by `config.base_path` from a repository
    pub fn from_repository(repo: &dyn ModelRepository, config: TaskConfig) -> Result<Self> {
        let encoder = repo.encoder(&config.base_path)?;
        Ok(Self::new(config, encoder))
    }

    /// Binary cross-entropy with built-in logit sigmoid
    ///
    /// Panics if logits and targets disagree in length.
    pub fn loss(logits: &Tensor, targets: &Tensor) -> Tensor {
        BceWithLogitsLoss.forward(logits, targets)
    }

    /// The hyperparameter snapshot
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Forward the batch and compute the loss; logits come back 1-D
    fn shared_step(&self, batch: &SequenceBatch, training: bool) -> Result<(Tensor, Tensor)> {
        {
            let mut ctx = self.ctx.borrow_mut();
            if training {
                ctx.train();
            } else {
                ctx.eval();
            }
        }
        let logits = self.model.forward(
            &batch.ids_seq,
            &batch.attn_masks,
            batch.token_type_ids.as_deref(),
            batch.batch_size,
            batch.seq_len,
            &self.ctx.borrow(),
        )?;
        let loss = Self::loss(&logits, &batch.target);
        Ok((logits, loss))
    }

    fn epoch_scores(outputs: &EpochBuffer) -> EpochScores {
        let y_pred = sigmoid_threshold(&outputs.concat_logits(), 0.5);
        let y_true = targets_to_int(&outputs.concat_true_preds());

        let pred_int: Vec<i64> = y_pred.iter().map(|&p| i64::from(p)).collect();
        let true_bool: Vec<bool> = y_true.iter().map(|&t| t != 0).collect();

        EpochScores {
            accuracy: accuracy(&pred_int, &y_true),
            f1: binary_f1(&y_pred, &true_bool),
        }
    }
}

impl TaskModule for BinarySequenceTask {
    type Batch = SequenceBatch;

    fn training_step(
        &self,
        batch: &SequenceBatch,
        sink: &mut dyn MetricSink,
    ) -> Result<StepOutput> {
        let (logits, loss) = self.shared_step(batch, true)?;
        sink.log("train_loss", f64::from(loss.data()[0]), LogFlags::step_and_epoch());
        Ok(StepOutput {
            loss: Some(loss),
            logits,
            true_preds: batch.target.data(),
        })
    }

    fn validation_step(
        &self,
        batch: &SequenceBatch,
        sink: &mut dyn MetricSink,
    ) -> Result<StepOutput> {
        let (logits, loss) = self.shared_step(batch, false)?;
        sink.log("valid_loss", f64::from(loss.data()[0]), LogFlags::epoch_only());
        Ok(StepOutput {
            loss: None,
            logits,
            true_preds: batch.target.data(),
        })
    }

    fn configure_optimizers(&self) -> Result<AdamW> {
        let groups = vec![
            ParamGroup::new("backbone", self.model.encoder_parameters(), self.config.base_lr)?,
            ParamGroup::new("head", self.model.head_parameters(), self.config.linear_lr)?,
        ];
        AdamW::default_params(groups, self.config.base_lr)
    }

    fn train_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        let scores = Self::epoch_scores(&outputs);
        sink.log("train_acc", scores.accuracy, LogFlags::epoch_only());
        sink.log("train_f1", scores.f1, LogFlags::epoch_only());
        Ok(scores)
    }

    fn validation_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        let scores = Self::epoch_scores(&outputs);
        sink.log("val_acc", scores.accuracy, LogFlags::epoch_only());
        sink.log("val_f1", scores.f1, LogFlags::epoch_only());
        Ok(scores)
    }
}

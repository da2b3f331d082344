//! Multi-class sequence classification task

use super::{EpochBuffer, EpochScores, StepOutput, TaskConfig, TaskModule};
use crate::backbone::{ModelRepository, SequenceClassifier};
use crate::batch::LabeledBatch;
use crate::logging::{LogFlags, MetricSink};
use crate::loss::WeightedCrossEntropyLoss;
use crate::metrics::{accuracy, argmax_rows, filter_sentinel, targets_to_int, weighted_f1};
use crate::optim::{partition_by_classifier, AdamW, ParamGroup};
use crate::Result;
use ndarray::Array1;

/// Fixed per-class loss weights: class 1 emphasized, classes 0 and 2
/// down-weighted
pub const CLASS_WEIGHTS: [f32; 3] = [0.30, 1.0, 0.10];

/// Multi-class sequence classification over a pretrained model with its own
/// head and loss
///
/// The forward pass returns `[batch * num_labels]` logits and the model's
/// internal unweighted loss. Epoch metrics strip sentinel labels at every
/// stage, then score accuracy and weighted F1 over argmax predictions.
pub struct AutoSequenceTask {
    model: Box<dyn SequenceClassifier>,
    config: TaskConfig,
}

impl AutoSequenceTask {
    /// Bind an already-loaded sequence classifier
    pub fn new(config: TaskConfig, model: Box<dyn SequenceClassifier>) -> Self {
        Self { model, config }
    }

    /// Load the model named by `config.base_path` from a repository
    pub fn from_repository(repo: &dyn ModelRepository, config: TaskConfig) -> Result<Self> {
        let model = repo.sequence_classifier(&config.base_path, config.num_labels)?;
        Ok(Self::new(config, model))
    }

    /// The class-weighted loss this task declares
    ///
    /// The step path trains on the model's internal loss; this weighting is
    /// declared alongside it but never enters the backward pass.
    pub fn loss_fn() -> WeightedCrossEntropyLoss {
        WeightedCrossEntropyLoss::new(CLASS_WEIGHTS.to_vec())
    }

    /// The hyperparameter snapshot
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    fn shared_step(
        &self,
        batch: &LabeledBatch,
        loss_name: &str,
        sink: &mut dyn MetricSink,
        keep_loss: bool,
    ) -> Result<StepOutput> {
        let out = self.model.forward(batch)?;
        let flags = if keep_loss {
            LogFlags::step_and_epoch().with_prog_bar()
        } else {
            LogFlags::epoch_only().with_prog_bar()
        };
        sink.log(loss_name, f64::from(out.loss.data()[0]), flags);
        Ok(StepOutput {
            loss: if keep_loss { Some(out.loss) } else { None },
            logits: out.logits,
            true_preds: Array1::from(
                batch.labels.iter().map(|&l| l as f32).collect::<Vec<f32>>(),
            ),
        })
    }

    fn epoch_scores(&self, outputs: &EpochBuffer) -> EpochScores {
        let logits = outputs.concat_logits().to_vec();
        let y_pred = argmax_rows(&logits, self.model.num_labels());
        let y_true = targets_to_int(&outputs.concat_true_preds());
        let (y_pred, y_true) = filter_sentinel(&y_pred, &y_true);

        EpochScores {
            accuracy: accuracy(&y_pred, &y_true),
            f1: weighted_f1(&y_pred, &y_true),
        }
    }

    fn log_epoch(scores: EpochScores, stage: &str, announce: bool, sink: &mut dyn MetricSink) {
        if announce {
            println!(
                "==> {stage}_acc: {:.4}, {stage}_f1: {:.4}",
                scores.accuracy, scores.f1
            );
        }
        sink.log(&format!("{stage}_acc"), scores.accuracy, LogFlags::epoch_only());
        sink.log(&format!("{stage}_f1"), scores.f1, LogFlags::epoch_only());
    }
}

impl TaskModule for AutoSequenceTask {
    type Batch = LabeledBatch;

    fn training_step(&self, batch: &LabeledBatch, sink: &mut dyn MetricSink) -> Result<StepOutput> {
        self.shared_step(batch, "train_loss", sink, true)
    }

    fn validation_step(
        &self,
        batch: &LabeledBatch,
        sink: &mut dyn MetricSink,
    ) -> Result<StepOutput> {
        self.shared_step(batch, "valid_loss", sink, false)
    }

    fn test_step(&self, batch: &LabeledBatch, sink: &mut dyn MetricSink) -> Result<StepOutput> {
        self.shared_step(batch, "test_loss", sink, false)
    }

    fn configure_optimizers(&self) -> Result<AdamW> {
        let named = self.model.named_parameters();
        let (backbone, classifier) = partition_by_classifier(&named);
        let groups = vec![
            ParamGroup::new("backbone", backbone, self.config.base_lr)?,
            ParamGroup::new("classifier", classifier, self.config.linear_lr)?,
        ];
        AdamW::default_params(groups, self.config.base_lr)
    }

    fn train_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        let scores = self.epoch_scores(&outputs);
        Self::log_epoch(scores, "train", false, sink);
        Ok(scores)
    }

    fn validation_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        let scores = self.epoch_scores(&outputs);
        Self::log_epoch(scores, "val", true, sink);
        Ok(scores)
    }

    fn test_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        let scores = self.epoch_scores(&outputs);
        Self::log_epoch(scores, "test", true, sink);
        Ok(scores)
    }
}

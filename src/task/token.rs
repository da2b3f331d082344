//! Token classification task

use super::{EpochBuffer, EpochScores, StepOutput, TaskConfig, TaskModule};
use crate::backbone::{ModelRepository, TokenClassifier};
use crate::batch::LabeledBatch;
use crate::logging::{LogFlags, MetricSink};
use crate::metrics::{accuracy, argmax_rows, filter_sentinel, targets_to_int, weighted_f1};
use crate::optim::{partition_by_classifier, AdamW, ParamGroup};
use crate::Result;
use ndarray::Array1;

/// Label cardinality of the token tagger
pub const NUM_TOKEN_LABELS: usize = 2;

/// Per-token binary tagging over a pretrained token-classification model
///
/// The loss lives inside the pretrained model: the forward pass returns it
/// alongside `[batch * seq_len * 2]` logits, with sentinel-labeled positions
/// already excluded from it. Epoch metrics are accuracy and weighted F1 over
/// argmax predictions.
///
/// Only the training aggregation strips sentinel positions. Validation and
/// test score the raw label stream, sentinels included, so padded batches
/// read lower than their filtered counterparts.
pub struct TokenClassificationTask {
    model: Box<dyn TokenClassifier>,
    config: TaskConfig,
}

impl TokenClassificationTask {
    /// Bind an already-loaded token classifier
    pub fn new(config: TaskConfig, model: Box<dyn TokenClassifier>) -> Self {
        Self { model, config }
    }

    /// Load the model named by `config.base_path` from a repository
    pub fn from_repository(repo: &dyn ModelRepository, config: TaskConfig) -> Result<Self> {
        let model = repo.token_classifier(&config.base_path, NUM_TOKEN_LABELS)?;
        Ok(Self::new(config, model))
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
        flags: LogFlags,
        keep_loss: bool,
    ) -> Result<StepOutput> {
        let out = self.model.forward(batch)?;
        sink.log(loss_name, f64::from(out.loss.data()[0]), flags);
        Ok(StepOutput {
            loss: if keep_loss { Some(out.loss) } else { None },
            logits: out.logits,
            true_preds: Array1::from(
                batch.labels.iter().map(|&l| l as f32).collect::<Vec<f32>>(),
            ),
        })
    }

    fn epoch_scores(&self, outputs: &EpochBuffer, strip_sentinels: bool) -> EpochScores {
        let logits = outputs.concat_logits().to_vec();
        let y_pred = argmax_rows(&logits, self.model.num_labels());
        let y_true = targets_to_int(&outputs.concat_true_preds());

        let (y_pred, y_true) = if strip_sentinels {
            filter_sentinel(&y_pred, &y_true)
        } else {
            (y_pred, y_true)
        };

        EpochScores {
            accuracy: accuracy(&y_pred, &y_true),
            f1: weighted_f1(&y_pred, &y_true),
        }
    }

    fn log_epoch(scores: EpochScores, stage: &str, sink: &mut dyn MetricSink) {
        sink.log(&format!("{stage}_acc"), scores.accuracy, LogFlags::epoch_only());
        sink.log(&format!("{stage}_f1"), scores.f1, LogFlags::epoch_only());
    }
}

impl TaskModule for TokenClassificationTask {
    type Batch = LabeledBatch;

    fn training_step(&self, batch: &LabeledBatch, sink: &mut dyn MetricSink) -> Result<StepOutput> {
        self.shared_step(
            batch,
            "train_loss",
            sink,
            LogFlags::step_and_epoch().with_prog_bar(),
            true,
        )
    }

    fn validation_step(
        &self,
        batch: &LabeledBatch,
        sink: &mut dyn MetricSink,
    ) -> Result<StepOutput> {
        self.shared_step(
            batch,
            "valid_loss",
            sink,
            LogFlags::epoch_only().with_prog_bar(),
            false,
        )
    }

    fn test_step(&self, batch: &LabeledBatch, sink: &mut dyn MetricSink) -> Result<StepOutput> {
        self.shared_step(
            batch,
            "test_loss",
            sink,
            LogFlags::epoch_only().with_prog_bar(),
            false,
        )
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
        let scores = self.epoch_scores(&outputs, true);
        Self::log_epoch(scores, "train", sink);
        Ok(scores)
    }

    fn validation_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        let scores = self.epoch_scores(&outputs, false);
        Self::log_epoch(scores, "val", sink);
        Ok(scores)
    }

    fn test_epoch_end(
        &self,
        outputs: EpochBuffer,
        sink: &mut dyn MetricSink,
    ) -> Result<EpochScores> {
        let scores = self.epoch_scores(&outputs, false);
        Self::log_epoch(scores, "test", sink);
        Ok(scores)
    }
}

//! Forward contracts for pretrained models

use crate::batch::LabeledBatch;
use crate::{Result, Tensor};

/// Output of an encoder forward pass
pub struct EncoderOutput {
    /// Per-token representations, `[batch_size * seq_len * hidden_size]`
    pub sequence_output: Tensor,
    /// Fixed-size summary per sequence, `[batch_size * hidden_size]`
    pub pooled_output: Tensor,
}

/// A pretrained transformer encoder producing contextual representations
pub trait Encoder {
    /// Run the encoder over a flattened batch of token ids
    fn forward(
        &self,
        ids_seq: &[u32],
        attn_masks: &[u8],
        token_type_ids: Option<&[u32]>,
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EncoderOutput>;

    /// Hidden dimension of the representations
    fn hidden_size(&self) -> usize;

    /// Trainable parameters, for optimizer group construction
    fn parameters(&self) -> Vec<Tensor>;
}

/// Output of a task-specific pretrained model that computes its own loss
pub struct TaskOutput {
    /// Scalar loss computed by the model's internal head
    pub loss: Tensor,
    /// Raw logits; layout depends on the task
    pub logits: Tensor,
}

/// A pretrained model with a token-classification head and internal loss
///
/// Logits layout: `[batch_size * seq_len * num_labels]`. Positions whose
/// label is the sentinel −100 are excluded from the model's internal loss.
pub trait TokenClassifier {
    /// Forward the full batch through backbone and head
    fn forward(&self, batch: &LabeledBatch) -> Result<TaskOutput>;

    /// Named trainable parameters; names containing `"classifier"` belong
    /// to the head
    fn named_parameters(&self) -> Vec<(String, Tensor)>;

    /// Label cardinality
    fn num_labels(&self) -> usize;
}

/// A pretrained model with a sequence-classification head and internal loss
///
/// Logits layout: `[batch_size * num_labels]`.
pub trait SequenceClassifier {
    /// Forward the full batch through backbone and head
    fn forward(&self, batch: &LabeledBatch) -> Result<TaskOutput>;

    /// Named trainable parameters; names containing `"classifier"` belong
    /// to the head
    fn named_parameters(&self) -> Vec<(String, Tensor)>;

    /// Label cardinality
    fn num_labels(&self) -> usize;
}

/// Load-by-identifier contract over a pretrained weight repository
///
/// Implementations resolve an identifier (a local path or a hub name) to a
/// ready-to-fine-tune model. The repository itself, including downloads and
/// weight deserialization, is an external collaborator.
pub trait ModelRepository {
    /// Load a bare encoder
    fn encoder(&self, base_path: &str) -> Result<Box<dyn Encoder>>;

    /// Load an encoder with a token-classification head
    fn token_classifier(&self, base_path: &str, num_labels: usize)
        -> Result<Box<dyn TokenClassifier>>;

    /// Load an encoder with a sequence-classification head
    fn sequence_classifier(
        &self,
        base_path: &str,
        num_labels: usize,
    ) -> Result<Box<dyn SequenceClassifier>>;
}

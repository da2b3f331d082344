//! Batch data structures
//!
//! Batches are produced externally (tokenization and collation are out of
//! scope) and consumed read-only by the task modules. Sequence tensors are
//! stored flattened row-major as `[batch_size * seq_len]`.

use crate::Tensor;

/// A batch for binary sequence classification
#[derive(Clone)]
pub struct SequenceBatch {
    /// Token ids, `[batch_size * seq_len]`
    pub ids_seq: Vec<u32>,
    /// Attention mask, `[batch_size * seq_len]`, 1 = attend
    pub attn_masks: Vec<u8>,
    /// Optional segment ids, `[batch_size * seq_len]`
    pub token_type_ids: Option<Vec<u32>>,
    /// Per-sequence binary target, `[batch_size]`
    pub target: Tensor,
    /// Number of sequences in the batch
    pub batch_size: usize,
    /// Token count per sequence
    pub seq_len: usize,
}

impl SequenceBatch {
    /// Create a batch, validating the flattened layout
    pub fn new(
        ids_seq: Vec<u32>,
        attn_masks: Vec<u8>,
        target: Tensor,
        batch_size: usize,
        seq_len: usize,
    ) -> Self {
        assert_eq!(ids_seq.len(), batch_size * seq_len, "ids_seq layout mismatch");
        assert_eq!(attn_masks.len(), batch_size * seq_len, "attn_masks layout mismatch");
        assert_eq!(target.len(), batch_size, "target must have one entry per sequence");
        Self { ids_seq, attn_masks, token_type_ids: None, target, batch_size, seq_len }
    }

    /// Number of sequences
    pub fn size(&self) -> usize {
        self.batch_size
    }
}

/// A batch for token or multi-class sequence classification
///
/// Carries integer `labels` with the sentinel value −100 marking positions
/// excluded from loss computation. For token classification labels are
/// per-token (`[batch_size * seq_len]`); for sequence classification they
/// are per-sequence (`[batch_size]`). The whole batch is forwarded to the
/// underlying pretrained model.
#[derive(Clone)]
pub struct LabeledBatch {
    /// Token ids, `[batch_size * seq_len]`
    pub ids_seq: Vec<u32>,
    /// Attention mask, `[batch_size * seq_len]`, 1 = attend
    pub attn_masks: Vec<u8>,
    /// Integer labels; −100 marks excluded positions
    pub labels: Vec<i64>,
    /// Number of sequences in the batch
    pub batch_size: usize,
    /// Token count per sequence
    pub seq_len: usize,
}

impl LabeledBatch {
    /// Create a batch, validating the flattened layout
    pub fn new(
        ids_seq: Vec<u32>,
        attn_masks: Vec<u8>,
        labels: Vec<i64>,
        batch_size: usize,
        seq_len: usize,
    ) -> Self {
        assert_eq!(ids_seq.len(), batch_size * seq_len, "ids_seq layout mismatch");
        assert_eq!(attn_masks.len(), batch_size * seq_len, "attn_masks layout mismatch");
        assert!(
            labels.len() == batch_size * seq_len || labels.len() == batch_size,
            "labels must be per-token or per-sequence"
        );
        Self { ids_seq, attn_masks, labels, batch_size, seq_len }
    }

    /// Number of sequences
    pub fn size(&self) -> usize {
        self.batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_batch_creation() {
        let batch = SequenceBatch::new(
            vec![1, 2, 3, 4],
            vec![1, 1, 1, 0],
            Tensor::from_vec(vec![1.0, 0.0], false),
            2,
            2,
        );
        assert_eq!(batch.size(), 2);
        assert!(batch.token_type_ids.is_none());
    }

    #[test]
    #[should_panic(expected = "target must have one entry per sequence")]
    fn test_sequence_batch_bad_target() {
        SequenceBatch::new(
            vec![1, 2],
            vec![1, 1],
            Tensor::from_vec(vec![1.0, 0.0], false),
            1,
            2,
        );
    }

    #[test]
    fn test_labeled_batch_per_token_labels() {
        let batch = LabeledBatch::new(vec![1, 2, 3], vec![1, 1, 1], vec![1, -100, 0], 1, 3);
        assert_eq!(batch.labels.len(), 3);
    }

    #[test]
    fn test_labeled_batch_per_sequence_labels() {
        let batch = LabeledBatch::new(vec![1, 2, 3, 4], vec![1, 1, 1, 1], vec![2, 0], 2, 2);
        assert_eq!(batch.size(), 2);
    }

    #[test]
    #[should_panic(expected = "per-token or per-sequence")]
    fn test_labeled_batch_bad_labels() {
        LabeledBatch::new(vec![1, 2, 3, 4], vec![1, 1, 1, 1], vec![1, 2, 3], 2, 2);
    }
}

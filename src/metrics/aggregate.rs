//! Epoch-end aggregation helpers
//!
//! Per-batch step outputs are buffered over an epoch; these functions turn
//! the concatenated logit and target buffers into discrete predictions.

use crate::loss::BceWithLogitsLoss;
use ndarray::Array1;

/// Label value marking token positions excluded from loss/metric computation
pub const IGNORE_INDEX: i64 = -100;

/// Sigmoid then threshold: `σ(logit) >= threshold`
pub fn sigmoid_threshold(logits: &Array1<f32>, threshold: f32) -> Vec<bool> {
    BceWithLogitsLoss::sigmoid(logits)
        .iter()
        .map(|&p| p >= threshold)
        .collect()
}

/// Cast float targets to integer labels
pub fn targets_to_int(targets: &Array1<f32>) -> Vec<i64> {
    targets.iter().map(|&t| t as i64).collect()
}

/// Row-wise argmax over flattened `[rows * num_labels]` logits
pub fn argmax_rows(logits: &[f32], num_labels: usize) -> Vec<i64> {
    assert!(num_labels > 0, "num_labels must be > 0");
    assert_eq!(
        logits.len() % num_labels,
        0,
        "logits length must be a multiple of num_labels"
    );
    logits
        .chunks_exact(num_labels)
        .map(|row| {
            let mut best = 0usize;
            for (i, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = i;
                }
            }
            best as i64
        })
        .collect()
}

/// Boolean mask: true where the label is not the sentinel
pub fn sentinel_mask(y_true: &[i64]) -> Vec<bool> {
    y_true.iter().map(|&t| t != IGNORE_INDEX).collect()
}

/// Drop sentinel positions from both predictions and targets
pub fn filter_sentinel(y_pred: &[i64], y_true: &[i64]) -> (Vec<i64>, Vec<i64>) {
    assert_eq!(
        y_pred.len(),
        y_true.len(),
        "Predictions and targets must have same length"
    );
    let mask = sentinel_mask(y_true);
    let pred = y_pred
        .iter()
        .zip(mask.iter())
        .filter(|(_, &keep)| keep)
        .map(|(&p, _)| p)
        .collect();
    let truth = y_true
        .iter()
        .zip(mask.iter())
        .filter(|(_, &keep)| keep)
        .map(|(&t, _)| t)
        .collect();
    (pred, truth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_sigmoid_threshold() {
        let logits = arr1(&[2.0, -2.0, 0.0]);
        assert_eq!(sigmoid_threshold(&logits, 0.5), vec![true, false, true]);
    }

    #[test]
    fn test_targets_to_int_truncates() {
        let targets = arr1(&[1.0, 0.0, -100.0]);
        assert_eq!(targets_to_int(&targets), vec![1, 0, -100]);
    }

    #[test]
    fn test_argmax_rows() {
        // Two rows of three labels
        let logits = [0.1, 0.9, 0.0, 0.5, 0.2, 0.3];
        assert_eq!(argmax_rows(&logits, 3), vec![1, 0]);
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        let logits = [0.5, 0.5];
        assert_eq!(argmax_rows(&logits, 2), vec![0]);
    }

    #[test]
    #[should_panic(expected = "multiple of num_labels")]
    fn test_argmax_bad_length() {
        argmax_rows(&[0.1, 0.2, 0.3], 2);
    }

    #[test]
    fn test_sentinel_mask() {
        assert_eq!(sentinel_mask(&[1, -100, 0]), vec![true, false, true]);
    }

    #[test]
    fn test_filter_sentinel() {
        let (pred, truth) = filter_sentinel(&[1, 0, 1], &[1, -100, 0]);
        assert_eq!(pred, vec![1, 1]);
        assert_eq!(truth, vec![1, 0]);
    }

    #[test]
    fn test_filter_sentinel_no_sentinels() {
        let (pred, truth) = filter_sentinel(&[1, 0], &[0, 1]);
        assert_eq!(pred, vec![1, 0]);
        assert_eq!(truth, vec![0, 1]);
    }

    mod threshold_order_props {
        use super::*;
        use proptest::prelude::*;

        // Thresholding per-batch then concatenating must equal
        // concatenating logits then thresholding once.
        proptest! {
            #[test]
            fn threshold_commutes_with_concatenation(
                a in proptest::collection::vec(-10.0f32..10.0, 0..32),
                b in proptest::collection::vec(-10.0f32..10.0, 0..32),
            ) {
                let eager: Vec<bool> = sigmoid_threshold(&arr1(&a), 0.5)
                    .into_iter()
                    .chain(sigmoid_threshold(&arr1(&b), 0.5))
                    .collect();

                let mut all = a.clone();
                all.extend_from_slice(&b);
                let batched = sigmoid_threshold(&arr1(&all), 0.5);

                prop_assert_eq!(eager, batched);
            }
        }
    }
}

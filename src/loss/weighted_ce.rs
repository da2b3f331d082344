//! Cross-entropy with fixed per-class weights
//!
//! L = Σ_i w[y_i] * (-log softmax(x_i)[y_i]) / Σ_i w[y_i]
//!
//! The weighted mean matches the conventional reduction for class-weighted
//! cross-entropy: rare or emphasized classes contribute proportionally more
//! to the batch loss.

use crate::autograd::BackwardOp;
use crate::Tensor;
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Cross-entropy loss with a fixed, non-configurable class weighting.
///
/// Weights are baked in at construction and never derived from data.
pub struct WeightedCrossEntropyLoss {
    weights: Vec<f32>,
}

impl WeightedCrossEntropyLoss {
    /// Create a weighted cross-entropy loss with one weight per class
    pub fn new(weights: Vec<f32>) -> Self {
        assert!(!weights.is_empty(), "class weights must not be empty");
        Self { weights }
    }

    /// Class weights
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Name of the loss function
    pub fn name(&self) -> &'static str {
        "WeightedCrossEntropy"
    }

    /// Stable softmax over a logit row
    pub(crate) fn softmax(row: &[f32]) -> Vec<f32> {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp: Vec<f32> = row.iter().map(|&v| (v - max).exp()).collect();
        let sum: f32 = exp.iter().sum();
        exp.into_iter().map(|e| e / sum).collect()
    }

    /// Per-sample weighted negative log-likelihoods: w[y_i] * (-log p_{y_i})
    pub fn per_sample(&self, logits: &Tensor, targets: &[usize]) -> Vec<f32> {
        let num_classes = self.weights.len();
        assert_eq!(
            logits.len(),
            targets.len() * num_classes,
            "logits must have batch * num_classes elements"
        );

        let data = logits.to_vec();
        targets
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                assert!(y < num_classes, "target class {y} out of range");
                let row = &data[i * num_classes..(i + 1) * num_classes];
                let probs = Self::softmax(row);
                self.weights[y] * -(probs[y].max(f32::MIN_POSITIVE).ln())
            })
            .collect()
    }

    /// Weighted-mean batch loss over integer class targets
    ///
    /// `logits` is flattened `[batch * num_classes]` row-major.
    pub fn forward_batch(&self, logits: &Tensor, targets: &[usize]) -> Tensor {
        let num_classes = self.weights.len();
        let per_sample = self.per_sample(logits, targets);
        let weight_sum: f32 = targets.iter().map(|&y| self.weights[y]).sum();
        let total = per_sample.iter().sum::<f32>() / weight_sum;

        let mut loss = Tensor::from_vec(vec![total], true);

        // ∂L/∂x_ic = w[y_i] * (p_ic - 1{c = y_i}) / Σ w[y_j]
        let data = logits.to_vec();
        let mut grad = vec![0.0f32; logits.len()];
        for (i, &y) in targets.iter().enumerate() {
            let row = &data[i * num_classes..(i + 1) * num_classes];
            let probs = Self::softmax(row);
            for c in 0..num_classes {
                let indicator = if c == y { 1.0 } else { 0.0 };
                grad[i * num_classes + c] = self.weights[y] * (probs[c] - indicator) / weight_sum;
            }
        }

        struct WceBackward {
            logits: Tensor,
            grad: Array1<f32>,
            loss_grad: Rc<RefCell<Option<Array1<f32>>>>,
        }

        impl BackwardOp for WceBackward {
            fn backward(&self) {
                let scale = self
                    .loss_grad
                    .borrow()
                    .as_ref()
                    .map_or(1.0, |g| g[0]);
                self.logits.accumulate_grad(&self.grad * scale);
                if let Some(op) = self.logits.backward_op() {
                    op.backward();
                }
            }
        }

        if logits.requires_grad() {
            let op = Rc::new(WceBackward {
                logits: logits.clone(),
                grad: Array1::from(grad),
                loss_grad: loss.grad_cell(),
            });
            loss.set_backward_op(op);
        }

        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = WeightedCrossEntropyLoss::softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let probs = WeightedCrossEntropyLoss::softmax(&[1000.0, 1001.0, 1002.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        let sum: f32 = probs.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_uniform_logits_give_log_c() {
        // CE(uniform, C) = log(C); with a single sample the weight normalizes out
        let loss_fn = WeightedCrossEntropyLoss::new(vec![1.0, 1.0, 1.0]);
        let logits = Tensor::from_vec(vec![1.0, 1.0, 1.0], false);
        let loss = loss_fn.forward_batch(&logits, &[0]);
        assert_relative_eq!(loss.data()[0], 3.0f32.ln(), epsilon = 1e-4);
    }

    #[test]
    fn test_class_weighting_scales_per_sample_loss() {
        // Fixed policy weights: class 1 emphasized, classes 0 and 2 down-weighted
        let loss_fn = WeightedCrossEntropyLoss::new(vec![0.30, 1.0, 0.10]);

        // Same (wrong, uniform-confidence) logits; only the target class differs
        let logits = Tensor::from_vec(vec![1.0, 1.0, 1.0], false);
        let class1 = loss_fn.per_sample(&logits, &[1])[0];
        let class2 = loss_fn.per_sample(&logits, &[2])[0];

        assert_relative_eq!(class2 / class1, 0.10, epsilon = 1e-4);
    }

    #[test]
    fn test_correct_class2_cheaper_than_wrong_class1() {
        let loss_fn = WeightedCrossEntropyLoss::new(vec![0.30, 1.0, 0.10]);

        // Two-sample batch: a confidently-correct class-2 sample and an
        // equally-confident incorrect class-1 sample.
        let correct = loss_fn.per_sample(
            &Tensor::from_vec(vec![-2.0, -2.0, 4.0], false),
            &[2],
        )[0];
        let wrong = loss_fn.per_sample(
            &Tensor::from_vec(vec![-2.0, -2.0, 4.0], false),
            &[1],
        )[0];

        assert!(
            correct < wrong,
            "weighted loss should favor the correct class-2 sample: {correct} vs {wrong}"
        );
    }

    #[test]
    fn test_gradient_direction() {
        let loss_fn = WeightedCrossEntropyLoss::new(vec![0.5, 0.5]);
        let logits = Tensor::from_vec(vec![0.0, 0.0], true);
        let loss = loss_fn.forward_batch(&logits, &[0]);
        if let Some(op) = loss.backward_op() {
            op.backward();
        }
        let grad = logits.grad().unwrap();
        // Target class pushed up, other pushed down
        assert!(grad[0] < 0.0);
        assert!(grad[1] > 0.0);
    }

    #[test]
    #[should_panic(expected = "batch * num_classes")]
    fn test_shape_mismatch_panics() {
        let loss_fn = WeightedCrossEntropyLoss::new(vec![1.0, 1.0, 1.0]);
        let logits = Tensor::from_vec(vec![1.0, 2.0], false);
        loss_fn.forward_batch(&logits, &[0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_target_out_of_range_panics() {
        let loss_fn = WeightedCrossEntropyLoss::new(vec![1.0, 1.0]);
        let logits = Tensor::from_vec(vec![1.0, 2.0], false);
        loss_fn.forward_batch(&logits, &[5]);
    }
}

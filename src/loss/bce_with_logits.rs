//! Binary cross-entropy with logits
//!
//! Combines a sigmoid activation with binary cross-entropy in a single
//! numerically stable kernel:
//!
//! ```text
//! L_i = max(x_i, 0) - x_i * t_i + log(1 + exp(-|x_i|))
//! L = mean(L_i) over all i
//! ```
//!
//! Gradient: `∂L/∂x_i = (σ(x_i) - t_i) / N`

use crate::autograd::BackwardOp;
use crate::Tensor;
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

use super::LossFn;

/// Binary cross-entropy with logits loss.
///
/// The sigmoid is applied internally; callers pass raw logits. Targets are
/// 0.0/1.0 floats of the same length as the logits.
pub struct BceWithLogitsLoss;

impl BceWithLogitsLoss {
    /// Element-wise sigmoid: σ(x) = 1 / (1 + exp(-x)), computed stably
    pub(crate) fn sigmoid(x: &Array1<f32>) -> Array1<f32> {
        x.mapv(sigmoid_scalar)
    }

    /// Stable per-element BCE: max(x, 0) - x*t + log(1 + exp(-|x|))
    fn stable_bce(logit: f32, target: f32) -> f32 {
        let relu = logit.max(0.0);
        let abs_x = logit.abs();
        relu - logit * target + (1.0 + (-abs_x).exp()).ln()
    }
}

/// Numerically stable scalar sigmoid
pub(crate) fn sigmoid_scalar(v: f32) -> f32 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let exp_v = v.exp();
        exp_v / (1.0 + exp_v)
    }
}

impl LossFn for BceWithLogitsLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "Predictions and targets must have same length"
        );

        let pred_data = predictions.data();
        let target_data = targets.data();

        let total_loss: f32 = pred_data
            .iter()
            .zip(target_data.iter())
            .map(|(&logit, &target)| Self::stable_bce(logit, target))
            .sum::<f32>()
            / predictions.len() as f32;

        let mut loss = Tensor::from_vec(vec![total_loss], true);

        // ∂L/∂x_i = (σ(x_i) - t_i) / N
        let sigmoid_vals = Self::sigmoid(&pred_data);
        let n = predictions.len() as f32;
        let grad = (&sigmoid_vals - &target_data) / n;

        struct BceBackward {
            pred: Tensor,
            grad: Array1<f32>,
            loss_grad: Rc<RefCell<Option<Array1<f32>>>>,
        }

        impl BackwardOp for BceBackward {
            fn backward(&self) {
                let scale = self
                    .loss_grad
                    .borrow()
                    .as_ref()
                    .map_or(1.0, |g| g[0]);
                self.pred.accumulate_grad(&self.grad * scale);
                if let Some(op) = self.pred.backward_op() {
                    op.backward();
                }
            }
        }

        if predictions.requires_grad() {
            let op = Rc::new(BceBackward {
                pred: predictions.clone(),
                grad,
                loss_grad: loss.grad_cell(),
            });
            loss.set_backward_op(op);
        }

        loss
    }

    fn name(&self) -> &'static str {
        "BCEWithLogits"
    }
}

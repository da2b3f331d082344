//! Binary classification head: dropout + linear projection on pooled output

use super::{Encoder, EncoderOutput};
use crate::autograd::{add_bias, apply_mask, matmul, Context};
use crate::{Result, Tensor};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

/// Dropout rate applied to the pooled output before projection
pub const POOLED_DROPOUT_RATE: f32 = 0.3;

/// Inverted dropout
///
/// Consults the execution [`Context`]: in training mode each element is
/// zeroed with probability `rate` and the survivors are scaled by
/// `1/(1-rate)`, so evaluation needs no rescaling. In evaluation mode the
/// input passes through untouched.
pub struct Dropout {
    rate: f32,
    rng: RefCell<StdRng>,
}

impl Dropout {
    /// Create a dropout layer with the given rate and RNG seed
    pub fn new(rate: f32, seed: u64) -> Self {
        assert!((0.0..1.0).contains(&rate), "dropout rate must be in [0, 1)");
        Self { rate, rng: RefCell::new(StdRng::seed_from_u64(seed)) }
    }

    /// Dropout rate
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Apply dropout; identity when the context is in evaluation mode
    pub fn forward(&self, x: &Tensor, ctx: &Context) -> Tensor {
        if !ctx.is_training() || self.rate == 0.0 {
            return x.clone();
        }
        let scale = 1.0 / (1.0 - self.rate);
        let mut rng = self.rng.borrow_mut();
        let mask = Array1::from(
            (0..x.len())
                .map(|_| if rng.gen::<f32>() < self.rate { 0.0 } else { scale })
                .collect::<Vec<f32>>(),
        );
        apply_mask(x, mask)
    }
}

/// Linear projection from the encoder hidden size to output logits
///
/// Weight shape `[hidden_size, num_outputs]` flattened row-major, bias
/// `[num_outputs]`. Xavier-uniform initialized with a deterministic LCG.
pub struct ClassificationHead {
    /// Linear weight, `[hidden_size * num_outputs]`
    pub weight: Tensor,
    /// Bias, `[num_outputs]`
    pub bias: Tensor,
    hidden_size: usize,
    num_outputs: usize,
}

impl ClassificationHead {
    /// Create a head with Xavier-initialized weights
    pub fn new(hidden_size: usize, num_outputs: usize) -> Self {
        assert!(hidden_size > 0, "hidden_size must be > 0");
        assert!(num_outputs > 0, "num_outputs must be > 0");

        // Xavier uniform: U(-sqrt(6/(fan_in+fan_out)), +sqrt(6/(fan_in+fan_out)))
        let scale = (6.0 / (hidden_size + num_outputs) as f32).sqrt();
        let mut rng_state: u64 = 42;
        let weight_data: Vec<f32> = (0..hidden_size * num_outputs)
            .map(|_| {
                rng_state = rng_state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1);
                let u = (rng_state >> 33) as f32 / (1u64 << 31) as f32;
                (2.0 * u - 1.0) * scale
            })
            .collect();

        Self {
            weight: Tensor::from_vec(weight_data, true),
            bias: Tensor::zeros(num_outputs, true),
            hidden_size,
            num_outputs,
        }
    }

    /// Project pooled representations to logits
    ///
    /// `pooled` is `[batch_size * hidden_size]`; the result is
    /// `[batch_size * num_outputs]`.
    pub fn forward(&self, pooled: &Tensor, batch_size: usize) -> Tensor {
        let projected = matmul(pooled, &self.weight, batch_size, self.hidden_size, self.num_outputs);
        add_bias(&projected, &self.bias, batch_size, self.num_outputs)
    }

    /// Trainable parameters (weight + bias)
    pub fn parameters(&self) -> Vec<Tensor> {
        vec![self.weight.clone(), self.bias.clone()]
    }

    /// Hidden size
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Output dimension
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }
}

/// Backbone adapter + binary head
///
/// Runs the pretrained encoder, takes the pooled output, applies dropout
/// (active only while the [`Context`] is in training mode) and a
/// single-unit linear projection. No activation: the raw logit is returned
/// and the sigmoid is deferred to the loss and metric computation.
pub struct PooledClassifier {
    encoder: Box<dyn Encoder>,
    dropout: Dropout,
    head: ClassificationHead,
}

impl PooledClassifier {
    /// Wrap an encoder with a dropout + single-logit head
    pub fn new(encoder: Box<dyn Encoder>) -> Self {
        let hidden = encoder.hidden_size();
        Self {
            encoder,
            dropout: Dropout::new(POOLED_DROPOUT_RATE, 42),
            head: ClassificationHead::new(hidden, 1),
        }
    }

    /// Forward pass: encoder → pooled output → dropout → linear
    ///
    /// Returns one raw logit per sequence, `[batch_size]`.
    pub fn forward(
        &self,
        ids_seq: &[u32],
        attn_masks: &[u8],
        token_type_ids: Option<&[u32]>,
        batch_size: usize,
        seq_len: usize,
        ctx: &Context,
    ) -> Result<Tensor> {
        let EncoderOutput { pooled_output, .. } =
            self.encoder
                .forward(ids_seq, attn_masks, token_type_ids, batch_size, seq_len)?;
        let dropped = self.dropout.forward(&pooled_output, ctx);
        Ok(self.head.forward(&dropped, batch_size))
    }

    /// Backbone parameters (fine-tuned at the base learning rate)
    pub fn encoder_parameters(&self) -> Vec<Tensor> {
        self.encoder.parameters()
    }

    /// Head parameters (trained at the head learning rate)
    pub fn head_parameters(&self) -> Vec<Tensor> {
        self.head.parameters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FixedEncoder {
        hidden: usize,
        params: Vec<Tensor>,
    }

    impl FixedEncoder {
        fn new(hidden: usize) -> Self {
            Self { hidden, params: vec![Tensor::zeros(hidden, true)] }
        }
    }

    impl Encoder for FixedEncoder {
        fn forward(
            &self,
            _ids_seq: &[u32],
            _attn_masks: &[u8],
            _token_type_ids: Option<&[u32]>,
            batch_size: usize,
            seq_len: usize,
        ) -> Result<EncoderOutput> {
            Ok(EncoderOutput {
                sequence_output: Tensor::zeros(batch_size * seq_len * self.hidden, false),
                pooled_output: Tensor::from_vec(vec![0.5; batch_size * self.hidden], false),
            })
        }

        fn hidden_size(&self) -> usize {
            self.hidden
        }

        fn parameters(&self) -> Vec<Tensor> {
            self.params.clone()
        }
    }

    #[test]
    fn test_dropout_identity_in_eval() {
        let dropout = Dropout::new(0.3, 7);
        let mut ctx = Context::new();
        ctx.eval();
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
        let out = dropout.forward(&x, &ctx);
        assert_eq!(out.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_dropout_zero_rate_identity() {
        let dropout = Dropout::new(0.0, 7);
        let x = Tensor::from_vec(vec![1.0, 2.0], false);
        assert_eq!(dropout.forward(&x, &Context::new()).to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_dropout_drops_and_rescales() {
        let dropout = Dropout::new(0.5, 7);
        let x = Tensor::from_vec(vec![1.0; 1000], false);
        // Fresh context starts in training mode
        let out = dropout.forward(&x, &Context::new());
        let data = out.to_vec();

        let dropped = data.iter().filter(|&&v| v == 0.0).count();
        assert!(dropped > 300 && dropped < 700, "dropped {dropped} of 1000");
        // Survivors scaled by 1/(1-p) = 2
        assert!(data.iter().all(|&v| v == 0.0 || (v - 2.0).abs() < 1e-6));
    }

    #[test]
    fn test_head_output_shape() {
        let head = ClassificationHead::new(8, 1);
        let pooled = Tensor::from_vec(vec![0.1; 3 * 8], false);
        let logits = head.forward(&pooled, 3);
        assert_eq!(logits.len(), 3);
    }

    #[test]
    fn test_head_deterministic_init() {
        let a = ClassificationHead::new(16, 1);
        let b = ClassificationHead::new(16, 1);
        assert_eq!(a.weight.to_vec(), b.weight.to_vec());
    }

    #[test]
    fn test_head_bias_starts_zero() {
        let head = ClassificationHead::new(4, 2);
        assert_eq!(head.bias.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_head_xavier_bound() {
        let head = ClassificationHead::new(100, 1);
        let bound = (6.0f32 / 101.0).sqrt();
        assert!(head.weight.to_vec().iter().all(|w| w.abs() <= bound + 1e-6));
    }

    #[test]
    fn test_pooled_classifier_one_logit_per_sequence() {
        let model = PooledClassifier::new(Box::new(FixedEncoder::new(8)));
        let mut ctx = Context::new();
        ctx.eval();
        let logits = model
            .forward(&[1, 2, 3, 4], &[1, 1, 1, 1], None, 2, 2, &ctx)
            .unwrap();
        assert_eq!(logits.len(), 2);
        // Same pooled input for both sequences, same logit
        assert_relative_eq!(logits.data()[0], logits.data()[1], epsilon = 1e-6);
    }

    #[test]
    fn test_pooled_classifier_gradient_reaches_head() {
        let model = PooledClassifier::new(Box::new(FixedEncoder::new(4)));
        let mut logits = model
            .forward(&[1, 2], &[1, 1], None, 1, 2, &Context::new())
            .unwrap();

        crate::autograd::backward(&mut logits, Some(ndarray::arr1(&[1.0])));

        assert!(model.head.weight.grad().is_some());
        assert!(model.head.bias.grad().is_some());
    }

    #[test]
    fn test_parameter_split() {
        let model = PooledClassifier::new(Box::new(FixedEncoder::new(4)));
        assert_eq!(model.encoder_parameters().len(), 1);
        assert_eq!(model.head_parameters().len(), 2);
    }
}

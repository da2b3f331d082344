//! AdamW optimizer with parameter groups (Adam with decoupled weight decay)

use super::{Optimizer, ParamGroup};
use crate::{Error, Result};
use ndarray::Array1;

/// AdamW optimizer over one or more parameter groups
///
/// AdamW decouples weight decay from the gradient-based update, applying it
/// directly to the parameters:
///
/// `θ_t = (1 - lr * λ) * θ_{t-1} - lr_t * m_t / (√v_t + ε)`
///
/// Each group carries its own learning rate; moment buffers are shared
/// across groups under a single step counter.
#[derive(Debug)]
pub struct AdamW {
    default_lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    groups: Vec<ParamGroup>,
    // First and second moments, indexed [group][param]
    m: Vec<Vec<Option<Array1<f32>>>>,
    v: Vec<Vec<Option<Array1<f32>>>>,
}

impl AdamW {
    /// Create a new AdamW optimizer over the given groups
    ///
    /// # Errors
    /// Returns [`Error::EmptyParameterGroup`] if any group has no members,
    /// or [`Error::Config`] if there are no groups at all.
    pub fn new(
        groups: Vec<ParamGroup>,
        default_lr: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
        weight_decay: f32,
    ) -> Result<Self> {
        if groups.is_empty() {
            return Err(Error::Config(
                "optimizer needs at least one parameter group".to_string(),
            ));
        }
        for group in &groups {
            if group.params.is_empty() {
                return Err(Error::EmptyParameterGroup {
                    group: group.name,
                    detail: "optimizer groups must contain at least one parameter".to_string(),
                });
            }
        }

        let m = groups.iter().map(|g| vec![None; g.params.len()]).collect();
        let v = groups.iter().map(|g| vec![None; g.params.len()]).collect();

        Ok(Self { default_lr, beta1, beta2, epsilon, weight_decay, t: 0, groups, m, v })
    }

    /// Create AdamW with default hyperparameters (β1=0.9, β2=0.999, ε=1e-8,
    /// weight_decay=0.01)
    pub fn default_params(groups: Vec<ParamGroup>, default_lr: f32) -> Result<Self> {
        Self::new(groups, default_lr, 0.9, 0.999, 1e-8, 0.01)
    }

    /// Number of optimization steps taken
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// The parameter groups
    pub fn groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    /// Beta1 hyperparameter
    pub fn beta1(&self) -> f32 {
        self.beta1
    }

    /// Beta2 hyperparameter
    pub fn beta2(&self) -> f32 {
        self.beta2
    }

    /// Weight decay hyperparameter
    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }
}

impl Optimizer for AdamW {
    fn step(&mut self) {
        self.t += 1;

        // Bias correction folded into the step size
        let correction = (1.0 - self.beta2.powi(self.t as i32)).sqrt()
            / (1.0 - self.beta1.powi(self.t as i32));

        for (gi, group) in self.groups.iter().enumerate() {
            let lr = group.lr;
            let lr_t = lr * correction;

            for (pi, param) in group.params.iter().enumerate() {
                let Some(grad) = param.grad() else { continue };

                // m_t = β1 * m_{t-1} + (1 - β1) * g
                let m_t = if let Some(m) = &self.m[gi][pi] {
                    m * self.beta1 + &grad * (1.0 - self.beta1)
                } else {
                    &grad * (1.0 - self.beta1)
                };

                // v_t = β2 * v_{t-1} + (1 - β2) * g²
                let grad_sq = &grad * &grad;
                let v_t = if let Some(v) = &self.v[gi][pi] {
                    v * self.beta2 + &grad_sq * (1.0 - self.beta2)
                } else {
                    &grad_sq * (1.0 - self.beta2)
                };

                let adaptive_update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;

                // Decoupled weight decay applied directly to parameters
                let weight_decay_factor = 1.0 - lr * self.weight_decay;
                let updated = param.data() * weight_decay_factor - &adaptive_update;
                *param.data_mut() = updated;

                self.m[gi][pi] = Some(m_t);
                self.v[gi][pi] = Some(v_t);
            }
        }
    }

    fn zero_grad(&mut self) {
        for group in &self.groups {
            for param in &group.params {
                param.zero_grad();
            }
        }
    }

    fn lr(&self) -> f32 {
        self.default_lr
    }

    fn set_lr(&mut self, lr: f32) {
        // Group rates keep their ratio to the default rate
        if self.default_lr != 0.0 {
            let scale = lr / self.default_lr;
            for group in &mut self.groups {
                group.lr *= scale;
            }
        }
        self.default_lr = lr;
    }
}

//! Optimizer trait

/// Trait for optimization algorithms over internally-held parameter groups
///
/// Parameters are registered at construction (they alias the model's
/// tensors), so stepping needs no arguments: the external trainer runs the
/// backward pass, calls `step`, then `zero_grad`.
pub trait Optimizer {
    /// Perform a single optimization step over all parameter groups
    fn step(&mut self);

    /// Zero out all gradients
    fn zero_grad(&mut self);

    /// Get the default learning rate
    fn lr(&self) -> f32;

    /// Set the default learning rate, rescaling group rates proportionally
    fn set_lr(&mut self, lr: f32);
}

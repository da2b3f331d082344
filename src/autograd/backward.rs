//! Backward operation trait for the gradient tape

/// A node in the backward graph.
///
/// Implementations accumulate gradients into their input tensors' grad
/// cells and recursively invoke the backward ops of those inputs.
pub trait BackwardOp {
    /// Propagate gradients to inputs
    fn backward(&self);
}

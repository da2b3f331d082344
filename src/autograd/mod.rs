//! Tape-based autograd engine
//!
//! Provides automatic differentiation using a computational graph with
//! gradient tape. Tensors are flat `Array1<f32>` buffers; operations that
//! need a matrix view take explicit dimensions.

mod backward;
mod context;
mod ops;
mod tensor;

pub use backward::BackwardOp;
pub use context::Context;
pub use ops::{add_bias, apply_mask, matmul, matmul_compute, transpose};
pub use tensor::Tensor;

/// Perform backward pass on a tensor
pub fn backward(tensor: &mut Tensor, grad_output: Option<ndarray::Array1<f32>>) {
    if let Some(grad) = grad_output {
        tensor.set_grad(grad);
    } else {
        // Initialize with ones for scalar loss
        let ones = ndarray::Array1::ones(tensor.len());
        tensor.set_grad(ones);
    }

    if let Some(op) = tensor.backward_op() {
        op.backward();
    }
}

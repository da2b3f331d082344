//! Differentiable operations: matmul, bias add, element mask
//!
//! All matrices are row-major flat slices with explicit dimensions.

use super::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Transpose a row-major matrix (rows x cols) to (cols x rows)
#[inline]
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut transposed = vec![0.0f32; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            transposed[c * rows + r] = data[r * cols + c];
        }
    }
    transposed
}

/// Compute C = A @ B for row-major flat buffers
///
/// A is (m, k), B is (k, n), result is (m, n).
pub fn matmul_compute(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i in 0..m {
        for p in 0..k {
            let a_ip = a[i * k + p];
            if a_ip == 0.0 {
                continue;
            }
            for j in 0..n {
                c[i * n + j] += a_ip * b[p * n + j];
            }
        }
    }
    c
}

/// Matrix multiplication with backward pass
///
/// Gradients: `dA = dC @ B^T`, `dB = A^T @ dC`.
pub fn matmul(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Tensor {
    assert_eq!(a.len(), m * k, "matmul: A must have m*k elements");
    assert_eq!(b.len(), k * n, "matmul: B must have k*n elements");

    let a_data = a.data();
    let b_data = b.data();
    let c = matmul_compute(
        a_data.as_slice().expect("contiguous A"),
        b_data.as_slice().expect("contiguous B"),
        m,
        k,
        n,
    );

    let requires_grad = a.requires_grad() || b.requires_grad();
    let mut result = Tensor::from_vec(c, requires_grad);

    if requires_grad {
        let op = Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for MatmulBackward {
    fn backward(&self) {
        let grad = match self.result_grad.borrow().as_ref() {
            Some(g) => g.clone(),
            None => return,
        };
        let grad_slice = grad.as_slice().expect("contiguous grad");

        if self.a.requires_grad() {
            // dA = dC @ B^T : (m, n) @ (n, k)
            let b_data = self.b.data();
            let b_t = transpose(b_data.as_slice().expect("contiguous B"), self.k, self.n);
            let grad_a = matmul_compute(grad_slice, &b_t, self.m, self.n, self.k);
            self.a.accumulate_grad(Array1::from(grad_a));
        }
        if self.b.requires_grad() {
            // dB = A^T @ dC : (k, m) @ (m, n)
            let a_data = self.a.data();
            let a_t = transpose(a_data.as_slice().expect("contiguous A"), self.m, self.k);
            let grad_b = matmul_compute(&a_t, grad_slice, self.k, self.m, self.n);
            self.b.accumulate_grad(Array1::from(grad_b));
        }

        if let Some(op) = self.a.backward_op() {
            op.backward();
        }
        if let Some(op) = self.b.backward_op() {
            op.backward();
        }
    }
}

/// Broadcast-add a bias of length `cols` to each row of an (rows, cols) matrix
///
/// Gradients: `dX = dC`, `dbias = column sums of dC`.
pub fn add_bias(x: &Tensor, bias: &Tensor, rows: usize, cols: usize) -> Tensor {
    assert_eq!(x.len(), rows * cols, "add_bias: X must have rows*cols elements");
    assert_eq!(bias.len(), cols, "add_bias: bias must have cols elements");

    let x_data = x.data();
    let bias_data = bias.data();
    let mut out = x_data.to_vec();
    for r in 0..rows {
        for c in 0..cols {
            out[r * cols + c] += bias_data[c];
        }
    }

    let requires_grad = x.requires_grad() || bias.requires_grad();
    let mut result = Tensor::from_vec(out, requires_grad);

    if requires_grad {
        let op = Rc::new(AddBiasBackward {
            x: x.clone(),
            bias: bias.clone(),
            rows,
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct AddBiasBackward {
    x: Tensor,
    bias: Tensor,
    rows: usize,
    cols: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for AddBiasBackward {
    fn backward(&self) {
        let grad = match self.result_grad.borrow().as_ref() {
            Some(g) => g.clone(),
            None => return,
        };

        if self.x.requires_grad() {
            self.x.accumulate_grad(grad.clone());
        }
        if self.bias.requires_grad() {
            let mut bias_grad = vec![0.0f32; self.cols];
            for r in 0..self.rows {
                for c in 0..self.cols {
                    bias_grad[c] += grad[r * self.cols + c];
                }
            }
            self.bias.accumulate_grad(Array1::from(bias_grad));
        }

        if let Some(op) = self.x.backward_op() {
            op.backward();
        }
    }
}

/// Element-wise multiply by a fixed mask (no gradient through the mask)
///
/// Used for dropout: the mask holds `0.0` for dropped positions and the
/// inverted-dropout scale `1/(1-p)` for kept ones. Gradient: `dX = dC * mask`.
pub fn apply_mask(x: &Tensor, mask: Array1<f32>) -> Tensor {
    assert_eq!(x.len(), mask.len(), "apply_mask: mask length must match input");

    let out = x.data() * &mask;
    let requires_grad = x.requires_grad();
    let mut result = Tensor::new(out, requires_grad);

    if requires_grad {
        let op = Rc::new(MaskBackward {
            x: x.clone(),
            mask,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct MaskBackward {
    x: Tensor,
    mask: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for MaskBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                self.x.accumulate_grad(grad * &self.mask);
            }
        }
        if let Some(op) = self.x.backward_op() {
            op.backward();
        }
    }
}

//! Flat f32 tensor with shared gradient cell

use super::BackwardOp;
use ndarray::Array1;
use std::cell::{RefCell, RefMut};
use std::rc::Rc;

/// A 1-D f32 tensor with optional gradient tracking.
///
/// Data and gradient live behind `Rc<RefCell<..>>` so that clones alias the
/// same storage: an optimizer stepping on a cloned parameter updates the
/// model's weights, and backward ops accumulate into the same grad cell.
/// Multi-dimensional values are stored flattened row-major with dimensions
/// passed explicitly to the operations that need them.
#[derive(Clone)]
pub struct Tensor {
    data: Rc<RefCell<Array1<f32>>>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
    requires_grad: bool,
    backward_op: Option<Rc<dyn BackwardOp>>,
}

impl Tensor {
    /// Create a tensor from an ndarray buffer
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            grad: Rc::new(RefCell::new(None)),
            requires_grad,
            backward_op: None,
        }
    }

    /// Create a tensor from a Vec
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a zero-filled tensor of the given length
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// Snapshot of the current data
    pub fn data(&self) -> Array1<f32> {
        self.data.borrow().clone()
    }

    /// Mutable access to the underlying data buffer
    pub fn data_mut(&self) -> RefMut<'_, Array1<f32>> {
        self.data.borrow_mut()
    }

    /// Copy of the data as a Vec
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.borrow().to_vec()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Whether the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Whether gradients are tracked for this tensor
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Snapshot of the accumulated gradient, if any
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Shared handle to the gradient cell, for backward ops
    pub fn grad_cell(&self) -> Rc<RefCell<Option<Array1<f32>>>> {
        Rc::clone(&self.grad)
    }

    /// Overwrite the gradient
    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add into the gradient cell, initializing it if absent
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        if let Some(existing) = cell.as_mut() {
            *existing = &*existing + &grad;
        } else {
            *cell = Some(grad);
        }
    }

    /// Clear the gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// The backward op producing this tensor, if any
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    /// Attach the backward op producing this tensor
    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("len", &self.len())
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_from_vec() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        assert_eq!(t.len(), 3);
        assert!(t.requires_grad());
        assert!(t.grad().is_none());
    }

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(4, false);
        assert_eq!(t.to_vec(), vec![0.0; 4]);
        assert!(!t.requires_grad());
    }

    #[test]
    fn test_clones_share_data() {
        let t = Tensor::from_vec(vec![1.0, 2.0], true);
        let alias = t.clone();
        alias.data_mut()[0] = 9.0;
        assert_eq!(t.data()[0], 9.0);
    }

    #[test]
    fn test_clones_share_grad() {
        let t = Tensor::from_vec(vec![1.0, 2.0], true);
        let alias = t.clone();
        alias.accumulate_grad(arr1(&[0.5, 0.5]));
        assert_eq!(t.grad().unwrap()[0], 0.5);
    }

    #[test]
    fn test_accumulate_grad_adds() {
        let t = Tensor::from_vec(vec![1.0], true);
        t.accumulate_grad(arr1(&[1.0]));
        t.accumulate_grad(arr1(&[2.0]));
        assert_eq!(t.grad().unwrap()[0], 3.0);
    }

    #[test]
    fn test_zero_grad() {
        let t = Tensor::from_vec(vec![1.0], true);
        t.set_grad(arr1(&[5.0]));
        t.zero_grad();
        assert!(t.grad().is_none());
    }
}

//! Execution context: training vs evaluation mode

/// Tracks whether the computational graph is in training or evaluation
/// mode. Dropout is active only in training mode; the external trainer
/// flips the mode around its train/validation/test phases.
pub struct Context {
    training: bool,
}

impl Context {
    /// Create a new context (training mode)
    pub fn new() -> Self {
        Self { training: true }
    }

    /// Set training mode
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Set evaluation mode
    pub fn eval(&mut self) {
        self.training = false;
    }

    /// Check if in training mode
    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

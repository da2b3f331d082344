//! Error types for fine-tuning orchestration.

use thiserror::Error;

/// Errors surfaced to the external trainer.
///
/// Nothing is caught internally: a failed hook is fatal to the current
/// training step and recovery policy belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid hyperparameter configuration, rejected at construction time.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Optimizer construction found a parameter group with no members.
    #[error("Empty parameter group '{group}': {detail}")]
    EmptyParameterGroup { group: &'static str, detail: String },

    /// Pretrained model repository or forward pass failure.
    #[error("Model error: {0}")]
    Model(String),

    /// Lifecycle hook not implemented by this task variant.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Result type for fine-tuning operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Typed hyperparameter configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Immutable hyperparameter snapshot captured at task construction
///
/// Validated once, never mutated afterwards. `num_labels` is only consulted
/// by the multi-class variant; the token variant uses its fixed cardinality.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Pretrained model identifier (local path or hub name)
    pub base_path: String,
    /// Learning rate for the pretrained backbone parameters
    pub base_lr: f32,
    /// Learning rate for the freshly-initialized head parameters
    pub linear_lr: f32,
    /// Label cardinality for the multi-class variant
    pub num_labels: usize,
}

impl TaskConfig {
    /// Create a validated configuration with `num_labels = 2`
    ///
    /// # Errors
    /// Rejects an empty `base_path` and non-finite or non-positive
    /// learning rates.
    pub fn new(base_path: impl Into<String>, base_lr: f32, linear_lr: f32) -> Result<Self> {
        let config = Self { base_path: base_path.into(), base_lr, linear_lr, num_labels: 2 };
        config.validate()?;
        Ok(config)
    }

    /// Set the label cardinality
    pub fn with_num_labels(mut self, num_labels: usize) -> Result<Self> {
        if num_labels < 2 {
            return Err(Error::Config(format!(
                "num_labels must be >= 2, got {num_labels}"
            )));
        }
        self.num_labels = num_labels;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.base_path.is_empty() {
            return Err(Error::Config("base_path must not be empty".to_string()));
        }
        for (name, lr) in [("base_lr", self.base_lr), ("linear_lr", self.linear_lr)] {
            if !lr.is_finite() || lr <= 0.0 {
                return Err(Error::Config(format!("{name} must be finite and > 0, got {lr}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = TaskConfig::new("bert-base-uncased", 2e-5, 1e-3).unwrap();
        assert_eq!(config.base_path, "bert-base-uncased");
        assert_eq!(config.num_labels, 2);
    }

    #[test]
    fn test_with_num_labels() {
        let config = TaskConfig::new("model", 2e-5, 1e-3)
            .unwrap()
            .with_num_labels(3)
            .unwrap();
        assert_eq!(config.num_labels, 3);
    }

    #[test]
    fn test_empty_base_path_rejected() {
        assert!(TaskConfig::new("", 2e-5, 1e-3).is_err());
    }

    #[test]
    fn test_zero_lr_rejected() {
        assert!(TaskConfig::new("model", 0.0, 1e-3).is_err());
    }

    #[test]
    fn test_nan_lr_rejected() {
        assert!(TaskConfig::new("model", f32::NAN, 1e-3).is_err());
    }

    #[test]
    fn test_negative_linear_lr_rejected() {
        assert!(TaskConfig::new("model", 2e-5, -1.0).is_err());
    }

    #[test]
    fn test_num_labels_below_two_rejected() {
        let result = TaskConfig::new("model", 2e-5, 1e-3).unwrap().with_num_labels(1);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_is_cloneable_snapshot() {
        let config = TaskConfig::new("model", 2e-5, 1e-3).unwrap();
        let copy = config.clone();
        assert_eq!(copy.base_lr, config.base_lr);
        assert_eq!(copy.base_path, config.base_path);
    }
}

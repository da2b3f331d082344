//! Optimizers with parameter-group support
//!
//! Fine-tuning assigns distinct learning rates to the pretrained backbone
//! and the freshly-initialized classifier head. A [`ParamGroup`] carries a
//! parameter subset with its own learning rate; [`AdamW`] steps all groups
//! under one set of moment buffers.

mod adamw;
mod group;
mod optimizer;
mod scheduler;

pub use adamw::AdamW;
pub use group::{is_backbone_param, partition_by_classifier, ParamGroup};
pub use optimizer::Optimizer;
pub use scheduler::{LrScheduler, WarmupCosineLr};

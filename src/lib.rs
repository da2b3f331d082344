//! Fine-tuning orchestration for pretrained transformer classifiers
//!
//! Three task modules bind pretrained backbones to losses, per-batch step
//! logic, epoch-end metric aggregation, and grouped AdamW optimization:
//!
//! - [`task::BinarySequenceTask`]: binary sequence classification with an
//!   in-crate dropout + linear head under BCE-with-logits
//! - [`task::TokenClassificationTask`]: per-token binary tagging over a
//!   pretrained model that computes its own loss
//! - [`task::AutoSequenceTask`]: multi-class sequence classification with
//!   fixed class-weighted cross-entropy declared alongside
//!
//! An external trainer drives the lifecycle (`Init → {train ↔ valid}* →
//! test? → Teardown`), buffering step outputs into a [`task::EpochBuffer`]
//! and routing metrics through a [`logging::MetricSink`]. Data loading,
//! tokenization, and checkpointing are external collaborators.

pub mod autograd;
pub mod backbone;
pub mod batch;
pub mod error;
pub mod logging;
pub mod loss;
pub mod metrics;
pub mod optim;
pub mod task;

pub use autograd::Tensor;
pub use error::{Error, Result};

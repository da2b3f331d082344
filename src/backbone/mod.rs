//! Pretrained backbone adapters and the binary classification head
//!
//! The pretrained weight repository is an external collaborator: this
//! module defines the forward contracts ([`Encoder`], [`TokenClassifier`],
//! [`SequenceClassifier`]) and the load-by-identifier contract
//! ([`ModelRepository`]), plus the in-crate binary head that sits on the
//! encoder's pooled output.

mod encoder;
mod head;

pub use encoder::{
    Encoder, EncoderOutput, ModelRepository, SequenceClassifier, TaskOutput, TokenClassifier,
};
pub use head::{ClassificationHead, Dropout, PooledClassifier};

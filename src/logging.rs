//! Metric logging sink
//!
//! Task modules push scalar metrics through a [`MetricSink`]; the external
//! trainer decides where they land (progress bar, experiment tracker, ...).
//! [`MetricsRecorder`] is the in-crate implementation: an append-only record
//! useful for tests and offline inspection.

/// Routing flags attached to a logged metric
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogFlags {
    /// Emit the raw value at every step
    pub on_step: bool,
    /// Aggregate (mean) over the epoch and emit at the epoch boundary
    pub on_epoch: bool,
    /// Show in the progress bar
    pub prog_bar: bool,
    /// Forward to the persistent logger
    pub logger: bool,
}

impl LogFlags {
    /// Per-step and epoch-averaged, logger only
    pub fn step_and_epoch() -> Self {
        Self { on_step: true, on_epoch: true, prog_bar: false, logger: true }
    }

    /// Epoch-averaged only, logger only
    pub fn epoch_only() -> Self {
        Self { on_step: false, on_epoch: true, prog_bar: false, logger: true }
    }

    /// Also surface in the progress bar
    pub fn with_prog_bar(mut self) -> Self {
        self.prog_bar = true;
        self
    }
}

/// A single logged metric
#[derive(Clone, Debug)]
pub struct MetricRecord {
    /// Metric name, e.g. `train_loss` or `val_f1`
    pub name: String,
    /// Scalar value
    pub value: f64,
    /// Routing flags
    pub flags: LogFlags,
}

/// Destination for scalar metrics
pub trait MetricSink {
    /// Log one scalar under the given name
    fn log(&mut self, name: &str, value: f64, flags: LogFlags);
}

/// Append-only in-memory metric record
#[derive(Default)]
pub struct MetricsRecorder {
    records: Vec<MetricRecord>,
}

impl MetricsRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, in logging order
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// All values logged under `name`
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| r.name == name)
            .map(|r| r.value)
            .collect()
    }

    /// Most recent value logged under `name`
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.records
            .iter()
            .rev()
            .find(|r| r.name == name)
            .map(|r| r.value)
    }

    /// Mean of all values logged under `name` (epoch aggregation)
    pub fn mean(&self, name: &str) -> Option<f64> {
        let values = self.values(name);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Drop all records (epoch boundary)
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl MetricSink for MetricsRecorder {
    fn log(&mut self, name: &str, value: f64, flags: LogFlags) {
        self.records.push(MetricRecord { name: name.to_string(), value, flags });
    }
}

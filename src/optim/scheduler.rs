//! Warmup + cosine decay learning rate scheduler

use super::Optimizer;
use std::f32::consts::PI;

/// Trait for learning rate schedulers
pub trait LrScheduler {
    /// Learning rate for the current step
    fn get_lr(&self) -> f32;

    /// Advance to the next step
    fn step(&mut self);
}

/// Linear warmup followed by cosine annealing decay
///
/// - Phase 1 (warmup): linear increase from 0 to `lr_max`
/// - Phase 2 (decay): cosine decay from `lr_max` to `lr_min`
pub struct WarmupCosineLr {
    lr_max: f32,
    lr_min: f32,
    warmup_steps: usize,
    total_steps: usize,
    current_step: usize,
}

impl WarmupCosineLr {
    /// Create a new warmup + cosine decay scheduler
    pub fn new(lr_max: f32, lr_min: f32, warmup_steps: usize, total_steps: usize) -> Self {
        Self { lr_max, lr_min, warmup_steps, total_steps, current_step: 0 }
    }

    /// Apply the current learning rate to an optimizer
    pub fn apply<O: Optimizer>(&self, optimizer: &mut O) {
        optimizer.set_lr(self.get_lr());
    }
}

impl LrScheduler for WarmupCosineLr {
    fn get_lr(&self) -> f32 {
        if self.current_step < self.warmup_steps {
            if self.warmup_steps == 0 {
                return self.lr_max;
            }
            let progress = self.current_step as f32 / self.warmup_steps as f32;
            return self.lr_max * progress;
        }

        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps);
        if decay_steps == 0 {
            return self.lr_min;
        }

        let decay_step = self.current_step - self.warmup_steps;
        if decay_step >= decay_steps {
            return self.lr_min;
        }

        let progress = decay_step as f32 / decay_steps as f32;
        let cosine_decay = 0.5 * (1.0 + (PI * progress).cos());
        self.lr_min + (self.lr_max - self.lr_min) * cosine_decay
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}

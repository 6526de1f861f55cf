//! Loss tracking for value network training

use std::collections::VecDeque;
use std::time::Instant;

/// Moving average calculator
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: VecDeque<f32>,
    window_size: usize,
    sum: f32,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.window_size
            && let Some(old) = self.values.pop_front()
        {
            self.sum -= old;
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> f32 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f32
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Training metrics tracker
#[derive(Debug)]
pub struct TrainingMetrics {
    /// Recent batch losses
    pub batch_loss: MovingAverage,
    /// Mean loss of every finished epoch, in order
    pub epoch_losses: Vec<f32>,
    /// Samples consumed so far
    pub total_samples: usize,
    /// Optimizer steps taken so far
    pub total_batches: usize,
    epoch_loss_sum: f32,
    epoch_batches: usize,
    start_time: Instant,
}

impl TrainingMetrics {
    pub fn new(window_size: usize) -> Self {
        Self {
            batch_loss: MovingAverage::new(window_size),
            epoch_losses: Vec::new(),
            total_samples: 0,
            total_batches: 0,
            epoch_loss_sum: 0.0,
            epoch_batches: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one optimizer step
    pub fn record_batch(&mut self, loss: f32, samples: usize) {
        self.batch_loss.push(loss);
        self.epoch_loss_sum += loss;
        self.epoch_batches += 1;
        self.total_batches += 1;
        self.total_samples += samples;
    }

    /// Close the current epoch and return its mean batch loss
    pub fn finish_epoch(&mut self) -> f32 {
        let mean = if self.epoch_batches > 0 {
            self.epoch_loss_sum / self.epoch_batches as f32
        } else {
            0.0
        };
        self.epoch_losses.push(mean);
        self.epoch_loss_sum = 0.0;
        self.epoch_batches = 0;
        mean
    }

    pub fn training_duration_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn samples_per_second(&self) -> f64 {
        let duration = self.training_duration_secs();
        if duration > 0.0 {
            self.total_samples as f64 / duration
        } else {
            0.0
        }
    }

    /// Log current metrics to console
    pub fn log_to_console(&self, epoch: usize, epochs: usize) {
        tracing::info!(
            "Epoch {}/{} | loss {:.6} | recent {:.6} | batches {} | SPS {:.1}",
            epoch + 1,
            epochs,
            self.epoch_losses.last().copied().unwrap_or_default(),
            self.batch_loss.average(),
            self.total_batches,
            self.samples_per_second()
        );
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new(100)
    }
}

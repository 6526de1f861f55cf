//! Fitted-value regression: teach the network to predict the logged reward of
//! the action that was actually taken in each recorded state.

use std::fmt;

use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::seq::SliceRandom;

use super::dataset::TrainingSet;
use super::metrics::TrainingMetrics;
use super::policy::ValueNetwork;

/// Learning rate for bulk self-play data
pub const NORMAL_LEARNING_RATE: f64 = 1e-3;
/// Learning rate for human-vs-bot games
pub const FAST_LEARNING_RATE: f64 = 1e-2;
/// How often each human-vs-bot sample is repeated
pub const PLAY_MODE_DUPLICATION_FACTOR: usize = 20;

/// Training configuration
#[derive(Debug, Config)]
pub struct TrainConfig {
    /// Passes over the full data set
    #[config(default = 5)]
    pub epochs: usize,
    /// Mini-batch size; reduced to the sample count for small data sets
    #[config(default = 256)]
    pub batch_size: usize,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the training games came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TrainingMode {
    /// Self-play games
    #[default]
    Train,
    /// Games against a human; upweighted and learned faster
    Play,
}

impl TrainingMode {
    pub fn duplication_factor(&self) -> usize {
        match self {
            TrainingMode::Train => 1,
            TrainingMode::Play => PLAY_MODE_DUPLICATION_FACTOR,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            TrainingMode::Train => NORMAL_LEARNING_RATE,
            TrainingMode::Play => FAST_LEARNING_RATE,
        }
    }
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrainingMode::Train => write!(formatter, "train"),
            TrainingMode::Play => write!(formatter, "play"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainError {
    /// Refused: nothing to learn from
    EmptyDataset,
    /// A sample does not fit the network
    SampleShape {
        sample: usize,
        obs_len: usize,
        action: usize,
    },
}

impl fmt::Display for TrainError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrainError::EmptyDataset => write!(formatter, "no valid training data loaded"),
            TrainError::SampleShape {
                sample,
                obs_len,
                action,
            } => write!(
                formatter,
                "sample {} does not fit the network (obs length {}, action index {})",
                sample, obs_len, action
            ),
        }
    }
}

impl std::error::Error for TrainError {}

/// Summary of a finished training run
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub samples: usize,
    pub batch_size: usize,
    /// Mean batch loss per epoch
    pub epoch_losses: Vec<f32>,
}

impl TrainReport {
    pub fn final_loss(&self) -> Option<f32> {
        self.epoch_losses.last().copied()
    }
}

/// Value network trainer
pub struct Trainer<B: AutodiffBackend> {
    model: ValueNetwork<B>,
    config: TrainConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(model: ValueNetwork<B>, config: TrainConfig, device: B::Device) -> Self {
        Self {
            model,
            config,
            device,
        }
    }

    /// Train on the whole set for the configured number of epochs
    pub fn train(&mut self, dataset: &TrainingSet) -> Result<TrainReport, TrainError> {
        if dataset.is_empty() {
            tracing::error!("No valid training data loaded. Refusing to train.");
            return Err(TrainError::EmptyDataset);
        }
        self.check_samples(dataset)?;

        let num_samples = dataset.len();
        let batch_size = self.config.batch_size.clamp(1, num_samples);
        if batch_size < self.config.batch_size {
            tracing::warn!(
                "Total samples ({}) < batch size ({}). Reducing batch size.",
                num_samples,
                self.config.batch_size
            );
        }
        tracing::info!(
            "Starting training: {} samples, batch size {}, {} epochs, learning rate {}",
            num_samples,
            batch_size,
            self.config.epochs,
            self.config.learning_rate
        );

        let mut optimizer = AdamConfig::new().init::<B, ValueNetwork<B>>();
        let mut metrics = TrainingMetrics::default();
        let mut order: Vec<usize> = (0..num_samples).collect();
        let mut rng = rand::rng();

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);

            for batch in order.chunks(batch_size) {
                let loss = self.train_batch(dataset, batch, &mut optimizer);
                metrics.record_batch(loss, batch.len());
            }

            metrics.finish_epoch();
            metrics.log_to_console(epoch, self.config.epochs);
        }

        tracing::info!(
            "Training complete in {:.1}s",
            metrics.training_duration_secs()
        );

        Ok(TrainReport {
            samples: num_samples,
            batch_size,
            epoch_losses: metrics.epoch_losses,
        })
    }

    /// Reject samples whose shape does not match the network
    fn check_samples(&self, dataset: &TrainingSet) -> Result<(), TrainError> {
        let input_size = self.model.input_size();
        let output_size = self.model.output_size();

        let misfit = dataset
            .iter()
            .enumerate()
            .find(|(_, t)| t.obs.len() != input_size || t.action >= output_size);

        match misfit {
            Some((sample, triple)) => Err(TrainError::SampleShape {
                sample,
                obs_len: triple.obs.len(),
                action: triple.action,
            }),
            None => Ok(()),
        }
    }

    /// One optimizer step on the given sample indices, returns the batch loss
    fn train_batch<O: Optimizer<ValueNetwork<B>, B>>(
        &mut self,
        dataset: &TrainingSet,
        batch: &[usize],
        optimizer: &mut O,
    ) -> f32 {
        let batch_size = batch.len();
        let obs_size = self.model.input_size();

        let samples: Vec<_> = batch.iter().filter_map(|&i| dataset.get(i)).collect();
        let obs: Vec<f32> = samples.iter().flat_map(|t| t.obs.iter().copied()).collect();
        let actions: Vec<i64> = samples.iter().map(|t| t.action as i64).collect();
        let rewards: Vec<f32> = samples.iter().map(|t| t.reward).collect();

        let obs_tensor: Tensor<B, 2> = Tensor::<B, 1>::from_floats(obs.as_slice(), &self.device)
            .reshape([batch_size, obs_size]);
        let actions_tensor: Tensor<B, 2, Int> =
            Tensor::<B, 1, Int>::from_ints(actions.as_slice(), &self.device)
                .reshape([batch_size, 1]);
        let rewards_tensor = Tensor::<B, 1>::from_floats(rewards.as_slice(), &self.device);

        // Only the output unit of the taken action is regressed
        let predicted = self.model.action_values(obs_tensor, actions_tensor);
        let loss = MseLoss::new().forward(predicted, rewards_tensor, Reduction::Mean);
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = optimizer.step(self.config.learning_rate, self.model.clone(), grads);

        loss_value
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn model(&self) -> &ValueNetwork<B> {
        &self.model
    }

    /// Get the trained model (consumes the trainer)
    pub fn into_model(self) -> ValueNetwork<B> {
        self.model
    }
}

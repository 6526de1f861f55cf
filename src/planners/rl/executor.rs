//! RL Executor - runs the trained value network for inference

use std::fmt;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use rand::Rng;

use crate::state::{Action, GameState};

use super::action_space::ActionSpace;
use super::encoder::{EncoderConfig, EncodingError, StateEncoder};
use super::policy::{ValueNetwork, ValueNetworkConfig};
use super::selector::{ActionSelector, DEFAULT_EPSILON, SelectionError};
use super::weights::{self, WeightsError};

/// Default location of the weights file
pub const DEFAULT_WEIGHTS_PATH: &str = "server/model_weights.mpk";

/// Configuration for RL inference
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Path to the weights file
    pub weights_path: PathBuf,
    /// Epsilon-greedy exploration (training games only)
    pub explore: bool,
    pub epsilon: f64,
    /// Reject wrongly sized state sections instead of zero-filling them
    pub strict_encoding: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            explore: false,
            epsilon: DEFAULT_EPSILON,
            strict_encoding: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Observation length does not match the network input
    InputSize { expected: usize, found: usize },
    /// Scores could not be read back from the backend
    Readback(String),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InferenceError::InputSize { expected, found } => write!(
                formatter,
                "observation has {} values, network expects {}",
                found, expected
            ),
            InferenceError::Readback(msg) => write!(formatter, "could not read scores: {}", msg),
        }
    }
}

impl std::error::Error for InferenceError {}

/// Owned model plus the device it lives on. Constructed once at startup and
/// handed to whoever needs scores.
#[derive(Debug)]
pub struct ModelHandle<B: Backend> {
    model: ValueNetwork<B>,
    device: B::Device,
}

impl<B: Backend> ModelHandle<B> {
    pub fn new(model: ValueNetwork<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Freshly initialized weights
    pub fn init(config: &ValueNetworkConfig, device: B::Device) -> Self {
        let model = config.init::<B>(&device);
        Self::new(model, device)
    }

    /// Load weights from `path`; a missing or unreadable file leaves the
    /// freshly initialized weights in place.
    pub fn load_or_init(config: &ValueNetworkConfig, path: &Path, device: B::Device) -> Self {
        let model = config.init::<B>(&device);
        if !path.exists() {
            tracing::info!("No existing weights at {}, starting fresh", path.display());
            return Self::new(model, device);
        }

        match weights::load_model(model.clone(), path, &device) {
            Ok(loaded) => Self::new(loaded, device),
            Err(e) => {
                tracing::warn!(
                    "Failed to load weights from {}: {}. Starting fresh.",
                    path.display(),
                    e
                );
                Self::new(model, device)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), WeightsError> {
        weights::save_model(&self.model, path)
    }

    /// One raw score per action index for a single encoded state
    pub fn score(&self, obs: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let expected = self.model.input_size();
        if obs.len() != expected {
            return Err(InferenceError::InputSize {
                expected,
                found: obs.len(),
            });
        }

        let obs_tensor: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(obs, &self.device).reshape([1, expected]);

        self.model
            .forward(obs_tensor)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| InferenceError::Readback(format!("{:?}", e)))
    }

    /// Scores for several states in one forward pass, one row per state
    pub fn score_batch(&self, batch: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, InferenceError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self.model.input_size();
        if let Some(bad) = batch.iter().find(|obs| obs.len() != expected) {
            return Err(InferenceError::InputSize {
                expected,
                found: bad.len(),
            });
        }

        let flat: Vec<f32> = batch.iter().flatten().copied().collect();
        let obs_tensor: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([batch.len(), expected]);

        let width = self.model.output_size();
        let scores = self
            .model
            .forward(obs_tensor)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| InferenceError::Readback(format!("{:?}", e)))?;

        Ok(scores.chunks(width).map(<[f32]>::to_vec).collect())
    }

    pub fn model(&self) -> &ValueNetwork<B> {
        &self.model
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

#[derive(Debug)]
pub enum DecisionError {
    Encoding(EncodingError),
    Inference(InferenceError),
    Selection(SelectionError),
}

impl fmt::Display for DecisionError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecisionError::Encoding(e) => write!(formatter, "encoding failed: {}", e),
            DecisionError::Inference(e) => write!(formatter, "inference failed: {}", e),
            DecisionError::Selection(e) => write!(formatter, "selection failed: {}", e),
        }
    }
}

impl std::error::Error for DecisionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecisionError::Encoding(e) => Some(e),
            DecisionError::Inference(e) => Some(e),
            DecisionError::Selection(e) => Some(e),
        }
    }
}

impl From<EncodingError> for DecisionError {
    fn from(e: EncodingError) -> Self {
        DecisionError::Encoding(e)
    }
}

impl From<InferenceError> for DecisionError {
    fn from(e: InferenceError) -> Self {
        DecisionError::Inference(e)
    }
}

impl From<SelectionError> for DecisionError {
    fn from(e: SelectionError) -> Self {
        DecisionError::Selection(e)
    }
}

/// The chosen action and where it sits in the request's action list
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub position: usize,
    pub action: Action,
}

/// RL Executor - encode, score, select
pub struct RLExecutor<B: Backend> {
    handle: ModelHandle<B>,
    encoder: StateEncoder,
    selector: ActionSelector,
    config: InferenceConfig,
}

impl<B: Backend> RLExecutor<B> {
    pub fn new(handle: ModelHandle<B>, config: InferenceConfig) -> Self {
        let encoder = StateEncoder::new(EncoderConfig {
            strict: config.strict_encoding,
            ..EncoderConfig::default()
        });
        let selector = ActionSelector::new(ActionSpace::new(encoder.config().board), config.epsilon);

        Self {
            handle,
            encoder,
            selector,
            config,
        }
    }

    /// Standard-size network with weights from the configured path
    pub fn load(config: InferenceConfig, device: B::Device) -> Self {
        let handle =
            ModelHandle::load_or_init(&ValueNetworkConfig::standard(), &config.weights_path, device);
        Self::new(handle, config)
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn handle(&self) -> &ModelHandle<B> {
        &self.handle
    }

    /// Choose one of the state's available actions
    pub fn decide(&self, state: &GameState) -> Result<Decision, DecisionError> {
        self.decide_with_rng(state, &mut rand::rng())
    }

    pub fn decide_with_rng<R: Rng>(
        &self,
        state: &GameState,
        rng: &mut R,
    ) -> Result<Decision, DecisionError> {
        let legal = &state.available_actions;
        if legal.is_empty() {
            return Err(SelectionError::NoSelectableAction.into());
        }

        let obs = self.encoder.encode(state)?;
        let scores = self.handle.score(&obs)?;
        tracing::debug!(
            "Scores (first 10): {:?}",
            &scores[..scores.len().min(10)]
        );

        let position = self
            .selector
            .select_position(&scores, legal, self.config.explore, rng)?;
        let action = legal[position].clone();
        tracing::info!("P{} Action: {}", state.current_player(), action.action_type());

        Ok(Decision { position, action })
    }
}

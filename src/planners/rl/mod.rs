//! Reinforcement learning planner using a value network over a fixed action space
//!
//! The network scores every action index for an encoded state; only the
//! actions the client lists as available are considered when choosing.
//! Training regresses the score of the taken action onto the (shaped)
//! reward logged for that turn.
//!
//! # Architecture
//!
//! ```text
//! GameState (JSON from the client)
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateEncoder                                               │
//! │  - Fixed-length vector (687 floats on the standard board)   │
//! │  - Strict or lenient handling of wrongly sized sections     │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ValueNetwork (via ModelHandle)                             │
//! │  - MLP: obs → one raw score per action index (201)          │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ActionSelector                                             │
//! │  - ActionSpace maps available actions to score indices      │
//! │  - Epsilon-greedy when exploring, greedy otherwise          │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//!  Chosen Action
//!
//! Game logs (.jsonl) ──► DatasetBuilder ──► Trainer ──► weights (.mpk)
//! ```

// Core modules that don't depend on Burn
pub mod action_space;
pub mod encoder;
pub mod metrics;
pub mod selector;

// Burn-dependent modules
pub mod dataset;
pub mod executor;
pub mod policy;
pub mod train;
pub mod weights;

// Re-export commonly used types
pub use action_space::ActionSpace;
pub use dataset::{
    DatasetBuilder, DatasetError, LoadReport, RewardShaping, TrainingSet, TrainingTriple,
};
pub use encoder::{EncoderConfig, EncodingError, StateEncoder};
pub use executor::{
    Decision, DecisionError, InferenceConfig, InferenceError, ModelHandle, RLExecutor,
};
pub use metrics::{MovingAverage, TrainingMetrics};
pub use policy::{ValueNetwork, ValueNetworkConfig};
pub use selector::{ActionSelector, SelectionError};
pub use train::{TrainConfig, TrainError, TrainReport, Trainer, TrainingMode};
pub use weights::WeightsError;

pub mod infra;
pub mod planners;
pub mod server;
pub mod state;

use burn::backend::{Autodiff, NdArray};

/// Backend used to score states in the server
pub type InferenceBackend = NdArray;
/// Backend used by the offline trainer
pub type TrainingBackend = Autodiff<NdArray>;

// Re-export commonly used types for convenience
pub use infra::ServerConfig;
pub use planners::rl::{RLExecutor, StateEncoder};
pub use state::{Action, GameState};

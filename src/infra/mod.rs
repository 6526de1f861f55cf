mod config;
mod logging;

pub use config::{
    BIND_VAR, DEFAULT_BIND, EPSILON_VAR, STRICT_ENCODING_VAR, ServerConfig, TRAIN_MODE_VAR,
    WEIGHTS_VAR,
};
pub use logging::{DEFAULT_FILTER, init_logging};

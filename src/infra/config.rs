//! Environment-driven configuration for the inference server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::planners::rl::InferenceConfig;

pub const TRAIN_MODE_VAR: &str = "CATAN_TRAIN_MODE";
pub const BIND_VAR: &str = "SETTLERBOT_BIND";
pub const WEIGHTS_VAR: &str = "SETTLERBOT_WEIGHTS";
pub const STRICT_ENCODING_VAR: &str = "SETTLERBOT_STRICT_ENCODING";
pub const EPSILON_VAR: &str = "SETTLERBOT_EPSILON";

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub inference: InferenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            inference: InferenceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the process environment (call `dotenv().ok()` first to pick up `.env`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = lookup(BIND_VAR).filter(|v| !v.trim().is_empty()) {
            config.bind = bind.trim().to_string();
        }
        if let Some(path) = lookup(WEIGHTS_VAR).filter(|v| !v.trim().is_empty()) {
            config.inference.weights_path = PathBuf::from(path.trim());
        }
        if let Some(explore) = parse_flag(&lookup, TRAIN_MODE_VAR) {
            config.inference.explore = explore;
        }
        if let Some(strict) = parse_flag(&lookup, STRICT_ENCODING_VAR) {
            config.inference.strict_encoding = strict;
        }
        if let Some(epsilon) = parse_var::<f64, _>(&lookup, EPSILON_VAR) {
            if (0.0..=1.0).contains(&epsilon) {
                config.inference.epsilon = epsilon;
            } else {
                tracing::warn!("{} must be within [0, 1], got {}", EPSILON_VAR, epsilon);
            }
        }

        config
    }

    pub fn log(&self) {
        tracing::info!("Bind address: {}", self.bind);
        tracing::info!("Weights file: {}", self.inference.weights_path.display());
        tracing::info!(
            "Training mode (exploration): {} (epsilon {})",
            self.inference.explore,
            self.inference.epsilon
        );
        tracing::info!("Strict encoding: {}", self.inference.strict_encoding);
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
    }
    parsed
}

/// Boolean-like flag: 1/true/yes/on or 0/false/no/off
fn parse_flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.bind, "0.0.0.0:5000");
        assert_eq!(
            config.inference.weights_path,
            PathBuf::from("server/model_weights.mpk")
        );
        assert!(!config.inference.explore);
        assert!(!config.inference.strict_encoding);
        assert!((config.inference.epsilon - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CATAN_TRAIN_MODE", "1"),
            ("SETTLERBOT_BIND", "127.0.0.1:8080"),
            ("SETTLERBOT_WEIGHTS", "/tmp/w.mpk"),
            ("SETTLERBOT_STRICT_ENCODING", "true"),
            ("SETTLERBOT_EPSILON", "0.3"),
        ]);
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.inference.weights_path, PathBuf::from("/tmp/w.mpk"));
        assert!(config.inference.explore);
        assert!(config.inference.strict_encoding);
        assert!((config.inference.epsilon - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[
            ("CATAN_TRAIN_MODE", "maybe"),
            ("SETTLERBOT_EPSILON", "1.5"),
            ("SETTLERBOT_BIND", "  "),
        ]);
        assert!(!config.inference.explore);
        assert!((config.inference.epsilon - 0.15).abs() < 1e-12);
        assert_eq!(config.bind, DEFAULT_BIND);

        let config = config_from(&[("SETTLERBOT_EPSILON", "lots")]);
        assert!((config.inference.epsilon - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_train_mode_off() {
        assert!(!config_from(&[("CATAN_TRAIN_MODE", "0")]).inference.explore);
        assert!(!config_from(&[("CATAN_TRAIN_MODE", "false")]).inference.explore);
    }
}

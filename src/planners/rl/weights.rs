//! Weight persistence
//!
//! Weights are stored as named MessagePack records. A save never leaves a
//! half-written file at the target path: bytes go to a hidden sibling file
//! first, which is synced and then renamed over the target.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder};

use super::policy::ValueNetwork;

/// Extension used for weights files and checkpoints
pub const WEIGHTS_EXTENSION: &str = "mpk";

type WeightsRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

#[derive(Debug)]
pub enum WeightsError {
    Io(io::Error),
    /// The file is not a readable record
    Record(String),
    /// The record is for a network of another size, as (input, output)
    Shape {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// Nothing to checkpoint
    Missing(PathBuf),
}

impl fmt::Display for WeightsError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WeightsError::Io(e) => write!(formatter, "I/O error: {}", e),
            WeightsError::Record(msg) => write!(formatter, "invalid weights record: {}", msg),
            WeightsError::Shape { expected, found } => write!(
                formatter,
                "weights are for a {}x{} network, expected {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            WeightsError::Missing(path) => {
                write!(formatter, "weights file {} not found", path.display())
            }
        }
    }
}

impl std::error::Error for WeightsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WeightsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WeightsError {
    fn from(e: io::Error) -> Self {
        WeightsError::Io(e)
    }
}

/// Save the model weights to `path`, replacing any previous file atomically
pub fn save_model<B: Backend>(model: &ValueNetwork<B>, path: &Path) -> Result<(), WeightsError> {
    let recorder = WeightsRecorder::new();
    let bytes = Recorder::<B>::record(&recorder, model.clone().into_record(), ())
        .map_err(|e| WeightsError::Record(format!("{:?}", e)))?;

    write_atomic(path, &bytes)?;
    tracing::info!("Saved model weights to {}", path.display());
    Ok(())
}

/// Load weights from `path` into `model`. The stored network must have the
/// same input and output sizes as `model`.
pub fn load_model<B: Backend>(
    model: ValueNetwork<B>,
    path: &Path,
    device: &B::Device,
) -> Result<ValueNetwork<B>, WeightsError> {
    let expected = (model.input_size(), model.output_size());
    let bytes = fs::read(path)?;

    let recorder = WeightsRecorder::new();
    let record: <ValueNetwork<B> as Module<B>>::Record = Recorder::<B>::load(&recorder, bytes, device)
        .map_err(|e| WeightsError::Record(format!("{:?}", e)))?;
    let model = model.load_record(record);

    let found = (model.input_size(), model.output_size());
    if found != expected {
        return Err(WeightsError::Shape { expected, found });
    }

    tracing::info!("Loaded model weights from {}", path.display());
    Ok(model)
}

/// Copy the weights file to `<iterations_dir>/<set>.mpk`
pub fn checkpoint(weights: &Path, iterations_dir: &Path, set: u32) -> Result<PathBuf, WeightsError> {
    if !weights.is_file() {
        return Err(WeightsError::Missing(weights.to_path_buf()));
    }

    let target = iterations_dir.join(format!("{}.{}", set, WEIGHTS_EXTENSION));
    let bytes = fs::read(weights)?;
    write_atomic(&target, &bytes)?;

    tracing::info!("Saved checkpoint {} to {}", set, target.display());
    Ok(target)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    match written.and_then(|_| fs::rename(&tmp, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planners::rl::policy::ValueNetworkConfig;
    use burn::backend::NdArray;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type B = NdArray;

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "settlerbot-weights-{}-{}-{}",
            name,
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_config() -> ValueNetworkConfig {
        ValueNetworkConfig::new(6, 4)
            .with_hidden_size1(8)
            .with_hidden_size2(8)
    }

    fn scores(model: &ValueNetwork<B>) -> Vec<f32> {
        let obs = Tensor::<B, 2>::ones([1, 6], &Default::default());
        model.forward(obs).into_data().to_vec().unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("nested").join("model_weights.mpk");
        let device = Default::default();

        let original = small_config().init::<B>(&device);
        save_model(&original, &path).unwrap();
        assert!(path.is_file());
        assert!(!temp_path(&path).exists());

        let fresh = small_config().init::<B>(&device);
        let loaded = load_model(fresh, &path, &device).unwrap();
        assert_eq!(scores(&loaded), scores(&original));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = temp_dir("replace");
        let path = dir.join("model_weights.mpk");
        let device = Default::default();

        save_model(&small_config().init::<B>(&device), &path).unwrap();
        let second = small_config().init::<B>(&device);
        save_model(&second, &path).unwrap();

        let loaded = load_model(small_config().init::<B>(&device), &path, &device).unwrap();
        assert_eq!(scores(&loaded), scores(&second));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let dir = temp_dir("missing");
        let device = Default::default();

        let result = load_model(
            small_config().init::<B>(&device),
            &dir.join("absent.mpk"),
            &device,
        );
        assert!(matches!(result, Err(WeightsError::Io(_))));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = temp_dir("corrupt");
        let path = dir.join("model_weights.mpk");
        fs::write(&path, b"definitely not msgpack weights").unwrap();
        let device = Default::default();

        let result = load_model(small_config().init::<B>(&device), &path, &device);
        assert!(matches!(result, Err(WeightsError::Record(_))));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_checkpoint() {
        let dir = temp_dir("checkpoint");
        let weights = dir.join("model_weights.mpk");
        let iterations = dir.join("iterations");
        let device = Default::default();

        assert!(matches!(
            checkpoint(&weights, &iterations, 1),
            Err(WeightsError::Missing(_))
        ));

        save_model(&small_config().init::<B>(&device), &weights).unwrap();
        let target = checkpoint(&weights, &iterations, 3).unwrap();

        assert_eq!(target, iterations.join("3.mpk"));
        assert_eq!(fs::read(&target).unwrap(), fs::read(&weights).unwrap());

        fs::remove_dir_all(&dir).ok();
    }
}

//! Offline trainer: fit the value network to logged games and write the
//! weights file the decision server loads at startup.

use std::path::PathBuf;

use burn::module::AutodiffModule;
use clap::Parser;
use dotenv::dotenv;

use settlerbot::TrainingBackend;
use settlerbot::infra::{ServerConfig, init_logging};
use settlerbot::planners::rl::weights::{self, WeightsError};
use settlerbot::planners::rl::{
    ActionSpace, DatasetBuilder, EncoderConfig, RewardShaping, StateEncoder, TrainConfig, Trainer,
    TrainingMode, ValueNetworkConfig,
};

/// Value network training from game logs
#[derive(Parser, Debug)]
#[command(name = "settlerbot-train")]
#[command(about = "Train the settlerbot value network from logged games", long_about = None)]
struct Args {
    /// Self-play logs (train) or human-vs-bot logs (play)
    #[arg(long, value_enum, default_value_t = TrainingMode::Train)]
    mode: TrainingMode,

    /// Directory with one .jsonl file per game
    #[arg(long, default_value = "client/SelfPlayLogs")]
    logs: PathBuf,

    /// Weights file to continue from and overwrite (defaults to SETTLERBOT_WEIGHTS)
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Where numbered checkpoints are kept
    #[arg(long, default_value = "iterations")]
    iterations_dir: PathBuf,

    /// Copy the new weights to <iterations-dir>/<set>.mpk
    #[arg(long)]
    checkpoint: Option<u32>,

    #[arg(long, default_value_t = 5)]
    epochs: usize,

    #[arg(long, default_value_t = 256)]
    batch_size: usize,

    /// Override the mode's learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Skip turns whose state sections have the wrong length
    #[arg(long, default_value_t = false)]
    strict: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let args = Args::parse();
    let weights_path = args
        .weights
        .clone()
        .unwrap_or_else(|| ServerConfig::from_env().inference.weights_path);

    tracing::info!("Starting training in '{}' mode", args.mode);

    let encoder = StateEncoder::new(EncoderConfig {
        strict: args.strict,
        ..EncoderConfig::default()
    });
    let builder = DatasetBuilder::new(encoder, ActionSpace::default(), RewardShaping::default())
        .with_duplication_factor(args.mode.duplication_factor());
    let (dataset, _report) = builder.build(&args.logs)?;

    let device = Default::default();
    let mut model = ValueNetworkConfig::standard().init::<TrainingBackend>(&device);
    if weights_path.exists() {
        match weights::load_model(model.clone(), &weights_path, &device) {
            Ok(loaded) => model = loaded,
            Err(e) => tracing::warn!("Error loading weights: {}. Training from scratch.", e),
        }
    } else {
        tracing::info!("No existing weights found. Training from scratch.");
    }

    let learning_rate = args.learning_rate.unwrap_or(args.mode.learning_rate());
    let config = TrainConfig::new()
        .with_epochs(args.epochs)
        .with_batch_size(args.batch_size)
        .with_learning_rate(learning_rate);

    let mut trainer = Trainer::new(model, config, device);
    let report = trainer.train(&dataset)?;
    if let Some(loss) = report.final_loss() {
        tracing::info!("Final epoch loss: {:.6}", loss);
    }

    weights::save_model(&trainer.into_model().valid(), &weights_path)?;

    if let Some(set) = args.checkpoint {
        match weights::checkpoint(&weights_path, &args.iterations_dir, set) {
            Ok(_) => {}
            Err(WeightsError::Missing(path)) => {
                tracing::warn!("Weights file {} not found, no checkpoint saved", path.display())
            }
            Err(e) => tracing::warn!("Could not save checkpoint {}: {}", set, e),
        }
    }

    Ok(())
}

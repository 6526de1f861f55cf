//! Training data from logged games
//!
//! Every `.jsonl` file in the log directory holds one finished game:
//! `{"winnerPlayerIndex": 0, "turns": [{"state": .., "action": .., "reward": ..}, ..]}`.
//! Each usable turn becomes a (state vector, action index, reward) triple. The
//! winner's last turn gets a terminal bonus scaled by how quickly the game was won.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use burn::config::Config;
use serde::Deserialize;
use serde_json::Value;

use crate::state::{Action, GameState, lenient_i64};

use super::action_space::ActionSpace;
use super::encoder::StateEncoder;

/// Log files with any other extension are ignored
pub const LOG_EXTENSION: &str = "jsonl";

/// Terminal reward shaping
#[derive(Debug, Config)]
pub struct RewardShaping {
    /// Bonus added to the winner's last turn for a fast win
    #[config(default = 10.0)]
    pub base_win_bonus: f64,
    /// Games up to this many turns get the full bonus
    #[config(default = 120)]
    pub target_turns: usize,
    /// Games longer than this get no bonus
    #[config(default = 400)]
    pub max_turns: usize,
}

impl Default for RewardShaping {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardShaping {
    /// Fraction of the win bonus earned by a game of `num_turns` turns
    pub fn speed_multiplier(&self, num_turns: usize) -> f64 {
        if num_turns <= self.target_turns {
            1.0
        } else if num_turns > self.max_turns {
            0.0
        } else {
            let span = (self.max_turns - self.target_turns) as f64;
            1.0 - (num_turns - self.target_turns) as f64 / span
        }
    }
}

/// A single training sample
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTriple {
    pub obs: Vec<f32>,
    pub action: usize,
    pub reward: f32,
}

/// All samples of one build
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    samples: Vec<TrainingTriple>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sample: TrainingTriple) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrainingTriple> {
        self.samples.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingTriple> {
        self.samples.iter()
    }
}

impl From<Vec<TrainingTriple>> for TrainingSet {
    fn from(samples: Vec<TrainingTriple>) -> Self {
        Self { samples }
    }
}

/// Counters collected while reading a log directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files_found: usize,
    pub games_processed: usize,
    pub games_with_issues: usize,
    pub turns_processed: usize,
    pub invalid_turns: usize,
    pub samples: usize,
}

impl LoadReport {
    fn log(&self) {
        tracing::info!(
            "Finished loading logs. Processed {} of {} games successfully.",
            self.games_processed,
            self.files_found
        );
        if self.games_with_issues > 0 {
            tracing::warn!(
                "Skipped or encountered issues processing {} game files.",
                self.games_with_issues
            );
        }
        tracing::info!(
            "Turns processed: {}, invalid/skipped: {}, samples (after duplication): {}",
            self.turns_processed,
            self.invalid_turns,
            self.samples
        );
        if self.samples == 0 {
            tracing::error!("No valid training data loaded!");
        }
    }
}

#[derive(Debug)]
pub enum DatasetError {
    MissingDirectory(PathBuf),
    Io(std::io::Error),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DatasetError::MissingDirectory(path) => {
                write!(formatter, "log directory {} does not exist", path.display())
            }
            DatasetError::Io(e) => write!(formatter, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        DatasetError::Io(e)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameLog {
    #[serde(default, deserialize_with = "lenient_i64")]
    winner_player_index: Option<i64>,
    #[serde(default)]
    turns: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TurnRecord {
    #[serde(default)]
    state: Option<Value>,
    #[serde(default)]
    action: Option<Value>,
    #[serde(default)]
    reward: Option<Value>,
}

/// Why a log file contributed nothing
enum GameIssue {
    Unreadable(std::io::Error),
    Empty,
    Malformed(serde_json::Error),
    NoTurns,
}

impl fmt::Display for GameIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameIssue::Unreadable(e) => write!(formatter, "unreadable: {}", e),
            GameIssue::Empty => write!(formatter, "empty log file"),
            GameIssue::Malformed(e) => write!(formatter, "invalid JSON: {}", e),
            GameIssue::NoTurns => write!(formatter, "game with no turns"),
        }
    }
}

/// Turns log directories into training samples
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    encoder: StateEncoder,
    space: ActionSpace,
    shaping: RewardShaping,
    duplication_factor: usize,
}

impl DatasetBuilder {
    pub fn new(encoder: StateEncoder, space: ActionSpace, shaping: RewardShaping) -> Self {
        Self {
            encoder,
            space,
            shaping,
            duplication_factor: 1,
        }
    }

    /// Emit every valid sample `factor` times
    pub fn with_duplication_factor(mut self, factor: usize) -> Self {
        self.duplication_factor = factor;
        self
    }

    pub fn duplication_factor(&self) -> usize {
        self.duplication_factor
    }

    /// Read all games in `log_dir`. Per-file and per-turn problems are counted
    /// in the report; only a missing or unlistable directory is an error.
    pub fn build(&self, log_dir: &Path) -> Result<(TrainingSet, LoadReport), DatasetError> {
        if !log_dir.is_dir() {
            tracing::error!("Log directory {} does not exist!", log_dir.display());
            return Err(DatasetError::MissingDirectory(log_dir.to_path_buf()));
        }

        tracing::info!("Loading logs from {}", log_dir.display());
        if self.duplication_factor != 1 {
            tracing::info!("Applying sample duplication factor: {}", self.duplication_factor);
        }
        tracing::info!(
            "Reward shaping: base_win_bonus={}, target_turns={}, max_turns={}",
            self.shaping.base_win_bonus,
            self.shaping.target_turns,
            self.shaping.max_turns
        );

        let files = Self::log_files(log_dir)?;
        let mut report = LoadReport {
            files_found: files.len(),
            ..LoadReport::default()
        };
        if files.is_empty() {
            tracing::warn!("No .{} files found in {}", LOG_EXTENSION, log_dir.display());
        }

        let mut set = TrainingSet::new();
        for path in &files {
            match Self::read_game(path) {
                Ok(game) => {
                    self.add_game(&game, path, &mut set, &mut report);
                    report.games_processed += 1;
                }
                Err(issue) => {
                    tracing::warn!("Skipping {}: {}", path.display(), issue);
                    report.games_with_issues += 1;
                }
            }
        }

        report.samples = set.len();
        report.log();
        Ok((set, report))
    }

    fn log_files(log_dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(log_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == LOG_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parse the first JSON record of a log file
    fn read_game(path: &Path) -> Result<GameLog, GameIssue> {
        let content = fs::read_to_string(path).map_err(GameIssue::Unreadable)?;
        if content.trim().is_empty() {
            return Err(GameIssue::Empty);
        }

        let game = serde_json::Deserializer::from_str(&content)
            .into_iter::<GameLog>()
            .next()
            .ok_or(GameIssue::Empty)?
            .map_err(GameIssue::Malformed)?;

        if game.turns.is_empty() {
            return Err(GameIssue::NoTurns);
        }
        Ok(game)
    }

    fn add_game(&self, game: &GameLog, path: &Path, set: &mut TrainingSet, report: &mut LoadReport) {
        let num_turns = game.turns.len();
        let winner = game.winner_player_index.filter(|&w| w >= 0);

        let bonus_turn = winner.and_then(|winner| {
            game.turns.iter().rposition(|turn| {
                turn.get("state")
                    .and_then(|state| state.get("currentPlayerIndex"))
                    .and_then(Value::as_i64)
                    == Some(winner)
            })
        });
        let bonus = winner.map_or(0.0, |winner| {
            let multiplier = self.shaping.speed_multiplier(num_turns);
            tracing::debug!(
                "Game {}: winner {}, turns {}, speed multiplier {:.3}",
                path.display(),
                winner,
                num_turns,
                multiplier
            );
            self.shaping.base_win_bonus * multiplier
        });

        for (index, turn) in game.turns.iter().enumerate() {
            let Some((obs, action, reward)) = self.turn_sample(turn) else {
                report.invalid_turns += 1;
                continue;
            };

            let reward = if Some(index) == bonus_turn {
                if bonus > 0.0 {
                    tracing::debug!("  Applied speed bonus {:.2} to turn {}", bonus, index);
                }
                reward + bonus
            } else {
                reward
            };

            for _ in 0..self.duplication_factor {
                set.add(TrainingTriple {
                    obs: obs.clone(),
                    action,
                    reward: reward as f32,
                });
            }
            report.turns_processed += 1;
        }
    }

    /// Encoded state, action index and raw reward of one turn
    fn turn_sample(&self, turn: &Value) -> Option<(Vec<f32>, usize, f64)> {
        let record = TurnRecord::deserialize(turn).ok()?;
        let (state, action, reward) = (record.state?, record.action?, record.reward?);

        let reward = reward.as_f64()?;
        let state: GameState = serde_json::from_value(state)
            .inspect_err(|e| tracing::warn!("Invalid state in turn: {}", e))
            .ok()?;
        let action: Action = serde_json::from_value(action).ok()?;

        let obs = self
            .encoder
            .encode(&state)
            .inspect_err(|e| tracing::warn!("Could not encode turn state: {}", e))
            .ok()?;
        let index = self.space.index_of(&action)?;
        Some((obs, index, reward))
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new(
            StateEncoder::default(),
            ActionSpace::default(),
            RewardShaping::default(),
        )
    }
}

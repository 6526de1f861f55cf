//! State encoder for RL - converts a GameState snapshot to a flat feature vector
//!
//! Layout (standard board, 687 floats):
//!
//! | Section   | Per item                                   | Size        |
//! |-----------|--------------------------------------------|-------------|
//! | hexes     | terrain one-hot (6) + scaled number token  | 19 x 7      |
//! | roads     | owner one-hot (unowned, p0, p1)            | 72 x 3      |
//! | buildings | owner one-hot (3) + type one-hot (3)       | 54 x 6      |
//! | players   | 5 normalized resources + normalized VP     | 2 x 6       |
//! | global    | raw current player index, scaled dice      | 2           |

use std::fmt;

use crate::state::{BoardConfig, DESERT_TOKEN, GameState, NUM_RESOURCES, Resource, UNOWNED};

/// Configuration for the state encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Board geometry the vector layout is derived from
    pub board: BoardConfig,
    /// Fail on a wrongly sized section instead of zero-filling it
    pub strict: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::STANDARD,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// A state collection does not have the board's expected length (strict mode only)
    SectionLength {
        section: &'static str,
        expected: usize,
        found: usize,
    },
    /// The sections did not add up to the configured vector length
    VectorLength { expected: usize, found: usize },
}

impl fmt::Display for EncodingError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodingError::SectionLength {
                section,
                expected,
                found,
            } => write!(
                formatter,
                "expected {} {}, found {}",
                expected, section, found
            ),
            EncodingError::VectorLength { expected, found } => write!(
                formatter,
                "encoded vector has length {}, expected {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for EncodingError {}

/// State encoder producing fixed-length vectors
#[derive(Debug, Clone)]
pub struct StateEncoder {
    config: EncoderConfig,
}

impl StateEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Length of every vector this encoder produces
    pub fn obs_size(&self) -> usize {
        self.config.board.vector_len()
    }

    /// Encode a state into a vector of exactly `obs_size()` floats.
    pub fn encode(&self, state: &GameState) -> Result<Vec<f32>, EncodingError> {
        let board = &self.config.board;
        let mut obs = Vec::with_capacity(self.obs_size());

        self.encode_hexes(state, &mut obs)?;
        self.encode_roads(state, &mut obs)?;
        self.encode_buildings(state, &mut obs)?;
        self.encode_players(state, &mut obs)?;

        // Global features
        obs.push(state.current_player() as f32);
        obs.push(
            state
                .dice()
                .map(|dice| (dice - 2) as f32 / 10.0)
                .unwrap_or(0.0),
        );

        if obs.len() != board.vector_len() {
            return Err(EncodingError::VectorLength {
                expected: board.vector_len(),
                found: obs.len(),
            });
        }

        Ok(obs)
    }

    fn encode_hexes(&self, state: &GameState, obs: &mut Vec<f32>) -> Result<(), EncodingError> {
        let board = &self.config.board;
        if !self.check_section("hexes", board.hexes, state.hexes.len())? {
            obs.resize(obs.len() + board.hex_section_size(), 0.0);
            return Ok(());
        }

        for hex in &state.hexes {
            let mut features = [0.0; NUM_RESOURCES + 2];
            features[hex.terrain().slot()] = 1.0;
            features[NUM_RESOURCES + 1] = Self::scale_number_token(hex.number_token);
            obs.extend_from_slice(&features);
        }
        Ok(())
    }

    fn encode_roads(&self, state: &GameState, obs: &mut Vec<f32>) -> Result<(), EncodingError> {
        let board = &self.config.board;
        if !self.check_section("roads", board.edges, state.roads.len())? {
            obs.resize(obs.len() + board.road_section_size(), 0.0);
            return Ok(());
        }

        for (i, road) in state.roads.iter().enumerate() {
            let slot = self.owner_slot(road.owner_player_index, "road", i);
            obs.extend((0..board.owner_slots()).map(|s| if s == slot { 1.0 } else { 0.0 }));
        }
        Ok(())
    }

    fn encode_buildings(&self, state: &GameState, obs: &mut Vec<f32>) -> Result<(), EncodingError> {
        let board = &self.config.board;
        if !self.check_section("buildings", board.vertices, state.buildings.len())? {
            obs.resize(obs.len() + board.building_section_size(), 0.0);
            return Ok(());
        }

        for (i, building) in state.buildings.iter().enumerate() {
            let owner = self.owner_slot(building.owner_player_index, "building", i);
            obs.extend((0..board.owner_slots()).map(|s| if s == owner { 1.0 } else { 0.0 }));

            let kind = building.kind().slot();
            obs.extend((0..3).map(|s| if s == kind { 1.0 } else { 0.0 }));
        }
        Ok(())
    }

    fn encode_players(&self, state: &GameState, obs: &mut Vec<f32>) -> Result<(), EncodingError> {
        let board = &self.config.board;
        if !self.check_section("players", board.players, state.players.len())? {
            obs.resize(obs.len() + board.player_section_size(), 0.0);
            return Ok(());
        }

        for player in &state.players {
            obs.extend(Resource::ALL.iter().map(|&r| player.normalized_resource(r)));
            obs.push(player.normalized_victory_points());
        }
        Ok(())
    }

    /// Returns whether the section should be encoded. A mismatch is an error in
    /// strict mode and a zero-filled section otherwise.
    fn check_section(
        &self,
        section: &'static str,
        expected: usize,
        found: usize,
    ) -> Result<bool, EncodingError> {
        if expected == found {
            return Ok(true);
        }
        if self.config.strict {
            return Err(EncodingError::SectionLength {
                section,
                expected,
                found,
            });
        }
        tracing::warn!(
            "Expected {} {}, but found {}. Skipping {} encoding.",
            expected,
            section,
            found,
            section
        );
        Ok(false)
    }

    /// One-hot slot for an owner: 0 = unowned, 1 + i = player i.
    fn owner_slot(&self, owner: i64, kind: &str, index: usize) -> usize {
        if owner == UNOWNED {
            return 0;
        }
        match usize::try_from(owner) {
            Ok(player) if player < self.config.board.players => player + 1,
            _ => {
                tracing::warn!(
                    "Invalid {} owner index {} for {} {}. Treating as unowned.",
                    kind,
                    owner,
                    kind,
                    index
                );
                0
            }
        }
    }

    /// Scale a number token 2..=12 onto [0, 1]; missing tokens and the desert's 7 map to 0.
    fn scale_number_token(token: Option<i64>) -> f32 {
        match token {
            Some(t) if t != DESERT_TOKEN && t != 0 => ((t - 2) as f32 / 10.0).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

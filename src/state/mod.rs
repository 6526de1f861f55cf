mod action;
mod board;
mod game_state;
mod player_state;

pub use action::{Action, BANK_TRADE, BUILD_CITY, BUILD_ROAD, BUILD_SETTLEMENT, END_TURN};
pub use board::{
    ACTION_SPACE_SIZE, BoardConfig, BuildingType, DESERT_TOKEN, HexTerrain, MAX_RESOURCES_PER_TYPE,
    MAX_VICTORY_POINTS, NUM_BUILDING_TYPES, NUM_RESOURCES, Resource, VECTOR_LEN,
};
pub use game_state::{Building, GameState, Hex, Road, UNOWNED};
pub use player_state::PlayerState;

pub(crate) use game_state::lenient_i64;

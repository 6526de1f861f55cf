//! Game state snapshot as sent by the game client for every decision.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::action::Action;
use super::board::{BuildingType, HexTerrain};
use super::player_state::PlayerState;

/// Owner index used by the client for unowned roads and buildings.
pub const UNOWNED: i64 = -1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub current_player_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub dice_result: Option<i64>,
    #[serde(default)]
    pub hexes: Vec<Hex>,
    #[serde(default)]
    pub roads: Vec<Road>,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub players: Vec<PlayerState>,
    #[serde(default)]
    pub available_actions: Vec<Action>,
}

impl GameState {
    /// Index of the player to move, defaulting to player 0.
    pub fn current_player(&self) -> i64 {
        self.current_player_index.unwrap_or(0)
    }

    /// Dice result when it is a legal roll.
    pub fn dice(&self) -> Option<i64> {
        self.dice_result.filter(|d| (2..=12).contains(d))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hex {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number_token: Option<i64>,
}

impl Hex {
    pub fn terrain(&self) -> HexTerrain {
        HexTerrain::from_name(self.resource.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Road {
    #[serde(default = "unowned", deserialize_with = "owner_index")]
    pub owner_player_index: i64,
}

impl Default for Road {
    fn default() -> Self {
        Self {
            owner_player_index: UNOWNED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    #[serde(default = "unowned", deserialize_with = "owner_index")]
    pub owner_player_index: i64,
    #[serde(default, rename = "type")]
    pub building_type: Option<String>,
}

impl Building {
    pub fn kind(&self) -> BuildingType {
        BuildingType::from_name(self.building_type.as_deref())
    }
}

impl Default for Building {
    fn default() -> Self {
        Self {
            owner_player_index: UNOWNED,
            building_type: None,
        }
    }
}

fn unowned() -> i64 {
    UNOWNED
}

/// Accepts any JSON value; only integers (or integral floats) are kept.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }))
}

/// Null or non-integer owners read as unowned.
fn owner_index<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_i64(deserializer)?.unwrap_or(UNOWNED))
}

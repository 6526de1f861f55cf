use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::board::{MAX_RESOURCES_PER_TYPE, MAX_VICTORY_POINTS, Resource};
use super::game_state::lenient_i64;

/// Public per-player information carried in every state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(default)]
    pub resources: HashMap<String, Value>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub victory_points: Option<i64>,
}

impl PlayerState {
    /// Count held of `resource`, looked up under any of its wire names.
    pub fn resource_count(&self, resource: Resource) -> i64 {
        resource
            .aliases()
            .iter()
            .find_map(|name| self.resources.get(*name).and_then(Value::as_i64))
            .unwrap_or(0)
    }

    /// Resource count scaled into [0, 1].
    pub fn normalized_resource(&self, resource: Resource) -> f32 {
        let count = self.resource_count(resource).clamp(0, MAX_RESOURCES_PER_TYPE);
        count as f32 / MAX_RESOURCES_PER_TYPE as f32
    }

    /// Victory points scaled into [0, 1].
    pub fn normalized_victory_points(&self) -> f32 {
        let vp = self
            .victory_points
            .unwrap_or(0)
            .clamp(0, MAX_VICTORY_POINTS);
        vp as f32 / MAX_VICTORY_POINTS as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_lookup_by_alias() {
        let player: PlayerState = serde_json::from_value(json!({
            "resources": {"WOOD": 3, "BRICK": 1, "WOOL": 40},
            "victoryPoints": 4
        }))
        .unwrap();

        assert_eq!(player.resource_count(Resource::Lumber), 3);
        assert_eq!(player.resource_count(Resource::Grain), 0);
        assert!((player.normalized_resource(Resource::Wool) - 1.0).abs() < 1e-6);
        assert!((player.normalized_resource(Resource::Lumber) - 3.0 / 19.0).abs() < 1e-6);
        assert!((player.normalized_victory_points() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_victory_points_capped() {
        let player = PlayerState {
            victory_points: Some(14),
            ..PlayerState::default()
        };
        assert!((player.normalized_victory_points() - 1.0).abs() < 1e-6);
    }
}

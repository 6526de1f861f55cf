//! Actions exchanged with the game client.
//!
//! On the wire an action is a flat JSON object keyed by `actionType`. Known
//! kinds are parsed into typed variants; anything else is kept verbatim in
//! [`Action::Other`] so it can still be offered, selected and echoed back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::board::Resource;

pub const BUILD_ROAD: &str = "BUILD_ROAD";
pub const BUILD_SETTLEMENT: &str = "BUILD_SETTLEMENT";
pub const BUILD_CITY: &str = "BUILD_CITY";
pub const BANK_TRADE: &str = "BANK_TRADE_4_1";
pub const END_TURN: &str = "END_TURN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireAction", into = "WireAction")]
pub enum Action {
    BuildRoad { edge: i64 },
    BuildSettlement { intersection: i64 },
    BuildCity { intersection: i64 },
    BankTrade { give: Resource, receive: Resource },
    EndTurn,
    /// Unrecognised kind or a known kind with missing/unparseable parameters.
    Other(Map<String, Value>),
}

impl Action {
    /// The `actionType` tag, if present.
    pub fn action_type(&self) -> &str {
        match self {
            Action::BuildRoad { .. } => BUILD_ROAD,
            Action::BuildSettlement { .. } => BUILD_SETTLEMENT,
            Action::BuildCity { .. } => BUILD_CITY,
            Action::BankTrade { .. } => BANK_TRADE,
            Action::EndTurn => END_TURN,
            Action::Other(fields) => fields
                .get("actionType")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN"),
        }
    }

    pub fn is_end_turn(&self) -> bool {
        matches!(self, Action::EndTurn)
    }
}

/// Flat wire form of an action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edge_index: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intersection_index: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_out: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_in: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl WireAction {
    fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(action_type) = self.action_type {
            fields.insert("actionType".to_string(), Value::String(action_type));
        }
        if let Some(value) = self.edge_index {
            fields.insert("edgeIndex".to_string(), value);
        }
        if let Some(value) = self.intersection_index {
            fields.insert("intersectionIndex".to_string(), value);
        }
        if let Some(value) = self.resource_out {
            fields.insert("resourceOut".to_string(), value);
        }
        if let Some(value) = self.resource_in {
            fields.insert("resourceIn".to_string(), value);
        }
        fields.extend(self.extra);
        fields
    }
}

fn resource_of(value: Option<&Value>) -> Option<Resource> {
    value.and_then(Value::as_str).and_then(Resource::from_name)
}

impl From<WireAction> for Action {
    fn from(wire: WireAction) -> Self {
        let parsed = match wire.action_type.as_deref() {
            Some(BUILD_ROAD) => wire
                .edge_index
                .as_ref()
                .and_then(Value::as_i64)
                .map(|edge| Action::BuildRoad { edge }),
            Some(BUILD_SETTLEMENT) => wire
                .intersection_index
                .as_ref()
                .and_then(Value::as_i64)
                .map(|intersection| Action::BuildSettlement { intersection }),
            Some(BUILD_CITY) => wire
                .intersection_index
                .as_ref()
                .and_then(Value::as_i64)
                .map(|intersection| Action::BuildCity { intersection }),
            Some(BANK_TRADE) => resource_of(wire.resource_out.as_ref())
                .zip(resource_of(wire.resource_in.as_ref()))
                .map(|(give, receive)| Action::BankTrade { give, receive }),
            Some(END_TURN) => Some(Action::EndTurn),
            _ => None,
        };

        parsed.unwrap_or_else(|| Action::Other(wire.into_fields()))
    }
}

impl From<Action> for WireAction {
    fn from(action: Action) -> Self {
        let tagged = |tag: &str| WireAction {
            action_type: Some(tag.to_string()),
            ..WireAction::default()
        };

        match action {
            Action::BuildRoad { edge } => WireAction {
                edge_index: Some(Value::from(edge)),
                ..tagged(BUILD_ROAD)
            },
            Action::BuildSettlement { intersection } => WireAction {
                intersection_index: Some(Value::from(intersection)),
                ..tagged(BUILD_SETTLEMENT)
            },
            Action::BuildCity { intersection } => WireAction {
                intersection_index: Some(Value::from(intersection)),
                ..tagged(BUILD_CITY)
            },
            Action::BankTrade { give, receive } => WireAction {
                resource_out: Some(Value::from(give.name())),
                resource_in: Some(Value::from(receive.name())),
                ..tagged(BANK_TRADE)
            },
            Action::EndTurn => tagged(END_TURN),
            Action::Other(fields) => WireAction {
                extra: fields,
                ..WireAction::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Action {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(
            parse(json!({"actionType": "BUILD_ROAD", "edgeIndex": 5})),
            Action::BuildRoad { edge: 5 }
        );
        assert_eq!(
            parse(json!({"actionType": "BUILD_CITY", "intersectionIndex": 10})),
            Action::BuildCity { intersection: 10 }
        );
        assert_eq!(
            parse(json!({"actionType": "BANK_TRADE_4_1", "resourceOut": "WOOL", "resourceIn": "BRICK"})),
            Action::BankTrade {
                give: Resource::Wool,
                receive: Resource::Brick
            }
        );
        assert_eq!(parse(json!({"actionType": "END_TURN"})), Action::EndTurn);
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let raw = json!({"actionType": "MOVE_ROBBER", "targetHexIndex": 5, "targetPlayerIndex": 1});
        let action = parse(raw.clone());
        assert!(matches!(action, Action::Other(_)));
        assert_eq!(action.action_type(), "MOVE_ROBBER");
        assert_eq!(serde_json::to_value(&action).unwrap(), raw);
    }

    #[test]
    fn test_missing_parameter_becomes_other() {
        let raw = json!({"actionType": "BUILD_ROAD"});
        let action = parse(raw.clone());
        assert!(matches!(action, Action::Other(_)));
        assert_eq!(serde_json::to_value(&action).unwrap(), raw);
    }

    #[test]
    fn test_serialize_flat_fields() {
        let value = serde_json::to_value(Action::BuildSettlement { intersection: 3 }).unwrap();
        assert_eq!(
            value,
            json!({"actionType": "BUILD_SETTLEMENT", "intersectionIndex": 3})
        );
        let value = serde_json::to_value(Action::BankTrade {
            give: Resource::Lumber,
            receive: Resource::Ore,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"actionType": "BANK_TRADE_4_1", "resourceOut": "LUMBER", "resourceIn": "ORE"})
        );
    }
}

//! Action space management for RL - maps structured actions onto a fixed index range
//!
//! Indices are assigned in contiguous blocks, in this order:
//!
//! ```text
//! [0, E)                  build road on edge e
//! [E, E+V)                build settlement on vertex v
//! [E+V, E+2V)             build city on vertex v
//! [E+2V, E+2V+20)         bank trade (give, receive), give != receive, canonical order
//! E+2V+20                 end turn
//! ```

use std::ops::Range;

use crate::state::{Action, BoardConfig, NUM_RESOURCES, Resource};

/// Fixed action space for one board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpace {
    board: BoardConfig,
}

impl ActionSpace {
    pub fn new(board: BoardConfig) -> Self {
        Self { board }
    }

    /// Total number of indices
    pub fn len(&self) -> usize {
        self.board.action_space_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn road_range(&self) -> Range<usize> {
        0..self.board.edges
    }

    pub fn settlement_range(&self) -> Range<usize> {
        let start = self.road_range().end;
        start..start + self.board.vertices
    }

    pub fn city_range(&self) -> Range<usize> {
        let start = self.settlement_range().end;
        start..start + self.board.vertices
    }

    pub fn bank_trade_range(&self) -> Range<usize> {
        let start = self.city_range().end;
        start..start + self.board.bank_trade_count()
    }

    pub fn end_turn_index(&self) -> usize {
        self.bank_trade_range().end
    }

    /// Index of an action, or `None` when the action cannot take part in a
    /// decision (unknown kind or out-of-range parameter).
    pub fn index_of(&self, action: &Action) -> Option<usize> {
        match action {
            Action::BuildRoad { edge } => Self::offset(self.road_range(), *edge),
            Action::BuildSettlement { intersection } => {
                Self::offset(self.settlement_range(), *intersection)
            }
            Action::BuildCity { intersection } => Self::offset(self.city_range(), *intersection),
            Action::BankTrade { give, receive } => Self::trade_offset(*give, *receive)
                .map(|offset| self.bank_trade_range().start + offset),
            Action::EndTurn => Some(self.end_turn_index()),
            Action::Other(_) => None,
        }
    }

    /// The action stored at `index`.
    pub fn action_at(&self, index: usize) -> Option<Action> {
        let to_i64 = |range: Range<usize>| (index - range.start) as i64;

        if self.road_range().contains(&index) {
            Some(Action::BuildRoad {
                edge: to_i64(self.road_range()),
            })
        } else if self.settlement_range().contains(&index) {
            Some(Action::BuildSettlement {
                intersection: to_i64(self.settlement_range()),
            })
        } else if self.city_range().contains(&index) {
            Some(Action::BuildCity {
                intersection: to_i64(self.city_range()),
            })
        } else if self.bank_trade_range().contains(&index) {
            let (give, receive) = Self::trade_pair(index - self.bank_trade_range().start)?;
            Some(Action::BankTrade { give, receive })
        } else if index == self.end_turn_index() {
            Some(Action::EndTurn)
        } else {
            None
        }
    }

    fn offset(range: Range<usize>, parameter: i64) -> Option<usize> {
        let parameter = usize::try_from(parameter).ok()?;
        (parameter < range.len()).then(|| range.start + parameter)
    }

    /// Position of (give, receive) among the ordered pairs with give != receive.
    fn trade_offset(give: Resource, receive: Resource) -> Option<usize> {
        if give == receive {
            return None;
        }
        let (g, r) = (give.index(), receive.index());
        Some(g * (NUM_RESOURCES - 1) + if r > g { r - 1 } else { r })
    }

    fn trade_pair(offset: usize) -> Option<(Resource, Resource)> {
        let g = offset / (NUM_RESOURCES - 1);
        let mut r = offset % (NUM_RESOURCES - 1);
        if r >= g {
            r += 1;
        }
        Some((*Resource::ALL.get(g)?, *Resource::ALL.get(r)?))
    }
}

impl Default for ActionSpace {
    fn default() -> Self {
        Self::new(BoardConfig::STANDARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ACTION_SPACE_SIZE;
    use serde_json::{Map, json};
    use std::collections::HashSet;

    fn parse(value: serde_json::Value) -> Action {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_action_space_size() {
        let space = ActionSpace::default();
        assert_eq!(space.len(), 201);
        assert_eq!(space.len(), ACTION_SPACE_SIZE);
        assert_eq!(space.index_of(&Action::EndTurn), Some(space.len() - 1));
    }

    #[test]
    fn test_known_indices() {
        let space = ActionSpace::default();
        assert_eq!(space.index_of(&Action::BuildRoad { edge: 5 }), Some(5));
        assert_eq!(
            space.index_of(&Action::BuildSettlement { intersection: 10 }),
            Some(82)
        );
        assert_eq!(space.index_of(&Action::BuildCity { intersection: 10 }), Some(136));
        assert_eq!(
            space.index_of(&Action::BankTrade {
                give: Resource::Lumber,
                receive: Resource::Brick
            }),
            Some(180)
        );
        assert_eq!(
            space.index_of(&Action::BankTrade {
                give: Resource::Ore,
                receive: Resource::Grain
            }),
            Some(199)
        );
    }

    #[test]
    fn test_out_of_range_is_none() {
        let space = ActionSpace::default();
        assert_eq!(space.index_of(&Action::BuildRoad { edge: 99 }), None);
        assert_eq!(space.index_of(&Action::BuildRoad { edge: -1 }), None);
        assert_eq!(space.index_of(&Action::BuildCity { intersection: 54 }), None);
        assert_eq!(
            space.index_of(&Action::BankTrade {
                give: Resource::Wool,
                receive: Resource::Wool
            }),
            None
        );
        assert_eq!(space.index_of(&Action::Other(Map::new())), None);
        assert_eq!(
            space.index_of(&parse(json!({"actionType": "INVALID_ACTION"}))),
            None
        );
    }

    #[test]
    fn test_bank_trade_direction_matters() {
        let space = ActionSpace::default();
        let wool_for_brick =
            space.index_of(&parse(json!({"actionType": "BANK_TRADE_4_1", "resourceOut": "WOOL", "resourceIn": "BRICK"})));
        let brick_for_wool =
            space.index_of(&parse(json!({"actionType": "BANK_TRADE_4_1", "resourceOut": "BRICK", "resourceIn": "WOOL"})));

        let (a, b) = (wool_for_brick.unwrap(), brick_for_wool.unwrap());
        assert_ne!(a, b);
        assert!(space.bank_trade_range().contains(&a));
        assert!(space.bank_trade_range().contains(&b));
    }

    #[test]
    fn test_injective_and_round_trip() {
        let space = ActionSpace::default();
        let mut seen = HashSet::new();

        for index in 0..space.len() {
            let action = space.action_at(index).unwrap();
            assert_eq!(space.index_of(&action), Some(index));
            assert!(seen.insert(format!("{:?}", action)));
        }
        assert_eq!(space.action_at(space.len()), None);
    }

    #[test]
    fn test_ranges_are_contiguous() {
        let space = ActionSpace::default();
        assert_eq!(space.road_range(), 0..72);
        assert_eq!(space.settlement_range(), 72..126);
        assert_eq!(space.city_range(), 126..180);
        assert_eq!(space.bank_trade_range(), 180..200);
        assert_eq!(space.end_turn_index(), 200);
    }
}

//! Epsilon-greedy action selection over the legal actions of one decision point

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::state::Action;

use super::action_space::ActionSpace;

/// Default exploration probability
pub const DEFAULT_EPSILON: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// Empty legal action list, or nothing mappable and no end turn to fall back on
    NoSelectableAction,
}

impl fmt::Display for SelectionError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectionError::NoSelectableAction => write!(formatter, "no selectable action"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Picks one legal action from model scores
#[derive(Debug, Clone)]
pub struct ActionSelector {
    space: ActionSpace,
    epsilon: f64,
}

impl ActionSelector {
    pub fn new(space: ActionSpace, epsilon: f64) -> Self {
        Self {
            space,
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Select an action. With `explore` set, a uniformly random legal action is
    /// returned with probability epsilon; otherwise the legal action with the
    /// strictly highest score wins, ties going to the earliest.
    pub fn select<R: Rng>(
        &self,
        scores: &[f32],
        legal: &[Action],
        explore: bool,
        rng: &mut R,
    ) -> Result<Action, SelectionError> {
        self.select_position(scores, legal, explore, rng)
            .map(|position| legal[position].clone())
    }

    /// Same as [`select`](Self::select) but returns the position in `legal`.
    pub fn select_position<R: Rng>(
        &self,
        scores: &[f32],
        legal: &[Action],
        explore: bool,
        rng: &mut R,
    ) -> Result<usize, SelectionError> {
        if legal.is_empty() {
            tracing::warn!("Selection requested with no available actions");
            return Err(SelectionError::NoSelectableAction);
        }

        if explore && rng.random::<f64>() < self.epsilon {
            let positions: Vec<usize> = (0..legal.len()).collect();
            if let Some(&position) = positions.choose(rng) {
                tracing::debug!("Exploring: random action {}", legal[position].action_type());
                return Ok(position);
            }
        }

        let mut best: Option<(usize, f32)> = None;
        for (position, action) in legal.iter().enumerate() {
            let Some(index) = self.space.index_of(action) else {
                tracing::warn!("Could not map action to index: {:?}", action);
                continue;
            };
            let Some(&score) = scores.get(index) else {
                continue;
            };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((position, score)),
            }
        }

        if let Some((position, _)) = best {
            return Ok(position);
        }

        tracing::error!("No available actions could be mapped to valid indices!");
        legal
            .iter()
            .position(Action::is_end_turn)
            .ok_or(SelectionError::NoSelectableAction)
    }
}

impl Default for ActionSelector {
    fn default() -> Self {
        Self::new(ActionSpace::default(), DEFAULT_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Resource;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::{Map, Value};

    fn unknown(tag: &str) -> Action {
        let mut fields = Map::new();
        fields.insert("actionType".to_string(), Value::from(tag));
        Action::Other(fields)
    }

    fn scores_with(entries: &[(usize, f32)]) -> Vec<f32> {
        let mut scores = vec![0.0; ActionSpace::default().len()];
        for &(index, score) in entries {
            scores[index] = score;
        }
        scores
    }

    #[test]
    fn test_greedy_picks_highest_score() {
        let selector = ActionSelector::default();
        let mut rng = StdRng::seed_from_u64(7);
        let legal = vec![
            Action::BuildRoad { edge: 5 },
            Action::BuildSettlement { intersection: 10 },
            Action::EndTurn,
        ];
        let scores = scores_with(&[(5, 0.2), (82, 0.9), (200, -1.0)]);

        let chosen = selector.select(&scores, &legal, false, &mut rng).unwrap();
        assert_eq!(chosen, Action::BuildSettlement { intersection: 10 });
    }

    #[test]
    fn test_ties_go_to_first() {
        let selector = ActionSelector::default();
        let mut rng = StdRng::seed_from_u64(7);
        let legal = vec![Action::BuildRoad { edge: 3 }, Action::BuildRoad { edge: 1 }];
        let scores = scores_with(&[(3, 0.5), (1, 0.5)]);

        let chosen = selector.select(&scores, &legal, false, &mut rng).unwrap();
        assert_eq!(chosen, Action::BuildRoad { edge: 3 });
    }

    #[test]
    fn test_unmappable_actions_are_skipped() {
        let selector = ActionSelector::default();
        let mut rng = StdRng::seed_from_u64(7);
        let legal = vec![
            unknown("MOVE_ROBBER"),
            Action::BuildRoad { edge: 99 },
            Action::BankTrade {
                give: Resource::Ore,
                receive: Resource::Wool,
            },
        ];
        let scores = scores_with(&[(198, -3.0)]);

        let chosen = selector.select(&scores, &legal, false, &mut rng).unwrap();
        assert!(matches!(chosen, Action::BankTrade { .. }));
    }

    #[test]
    fn test_fallback_to_end_turn() {
        let selector = ActionSelector::default();
        let mut rng = StdRng::seed_from_u64(7);
        let legal = vec![unknown("MOVE_ROBBER"), Action::EndTurn];

        // Scores too short to cover any index
        let chosen = selector.select(&[], &legal, false, &mut rng).unwrap();
        assert_eq!(chosen, Action::EndTurn);
    }

    #[test]
    fn test_nothing_selectable() {
        let selector = ActionSelector::default();
        let mut rng = StdRng::seed_from_u64(7);
        let legal = vec![unknown("MOVE_ROBBER")];
        let scores = scores_with(&[]);

        assert_eq!(
            selector.select(&scores, &legal, false, &mut rng),
            Err(SelectionError::NoSelectableAction)
        );
    }

    #[test]
    fn test_empty_legal_actions() {
        let selector = ActionSelector::new(ActionSpace::default(), 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let scores = scores_with(&[]);

        for explore in [false, true] {
            assert_eq!(
                selector.select(&scores, &[], explore, &mut rng),
                Err(SelectionError::NoSelectableAction)
            );
        }
    }

    #[test]
    fn test_full_exploration_ignores_scores() {
        let selector = ActionSelector::new(ActionSpace::default(), 1.0);
        let mut rng = StdRng::seed_from_u64(42);
        let legal = vec![
            Action::BuildRoad { edge: 0 },
            Action::BuildRoad { edge: 1 },
            unknown("MOVE_ROBBER"),
        ];
        let scores = scores_with(&[(0, 100.0)]);

        let mut picked = [0usize; 3];
        for _ in 0..300 {
            picked[selector.select_position(&scores, &legal, true, &mut rng).unwrap()] += 1;
        }
        assert!(picked.iter().all(|&count| count > 0), "{:?}", picked);
    }

    #[test]
    fn test_no_exploration_when_disabled() {
        let selector = ActionSelector::new(ActionSpace::default(), 1.0);
        let mut rng = StdRng::seed_from_u64(42);
        let legal = vec![Action::BuildRoad { edge: 0 }, Action::BuildRoad { edge: 1 }];
        let scores = scores_with(&[(1, 2.0)]);

        for _ in 0..50 {
            let chosen = selector.select(&scores, &legal, false, &mut rng).unwrap();
            assert_eq!(chosen, Action::BuildRoad { edge: 1 });
        }
    }
}

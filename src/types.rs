//! Core domain types: observations, actions, rewards and transitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw observation of the game, in pixels and pixels per frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GameState {
    pub player_y: f64,
    pub player_vel: f64,
    pub next_pipe_dist_to_player: f64,
    pub next_pipe_top_y: f64,
    pub next_pipe_bottom_y: f64,
    pub next_next_pipe_dist_to_player: f64,
    pub next_next_pipe_top_y: f64,
    pub next_next_pipe_bottom_y: f64,
}

impl GameState {
    /// Vertical offset of the bird relative to the top of the next gap.
    ///
    /// Negative values mean the bird is above the top pipe's lower edge.
    pub fn delta_y(&self) -> f64 {
        self.player_y - self.next_pipe_top_y
    }
}

/// The two actions available in every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Flap the wings (index 0)
    Flap,
    /// Do nothing (index 1)
    Noop,
}

impl Action {
    /// Both actions in index order.
    pub const ALL: [Action; 2] = [Action::Flap, Action::Noop];

    /// Index of the action in value arrays.
    pub const fn index(self) -> usize {
        match self {
            Action::Flap => 0,
            Action::Noop => 1,
        }
    }

    /// Convert an index back into an action.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidAction`] for indices other than 0 or 1.
    pub fn from_index(index: usize) -> Result<Self, crate::Error> {
        match index {
            0 => Ok(Action::Flap),
            1 => Ok(Action::Noop),
            _ => Err(crate::Error::InvalidAction { index }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Flap => f.write_str("flap"),
            Action::Noop => f.write_str("noop"),
        }
    }
}

/// Rewards handed out by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardValues {
    /// Reward for passing through a pipe
    pub positive: f64,
    /// Reward for every frame survived
    pub tick: f64,
    /// Reward for crashing
    pub loss: f64,
}

impl RewardValues {
    pub const fn new(positive: f64, tick: f64, loss: f64) -> Self {
        Self {
            positive,
            tick,
            loss,
        }
    }

    /// Rewards used to score agents after training: one point per pipe.
    pub const fn evaluation() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

impl Default for RewardValues {
    fn default() -> Self {
        Self::new(1.0, 0.0, -5.0)
    }
}

/// A single observed state transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub action: Action,
    pub reward: f64,
    pub next_state: GameState,
    /// `true` when `next_state` is terminal
    pub terminal: bool,
}

/// Bucketed observation used as a value-table key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscreteState(Vec<i32>);

impl DiscreteState {
    pub fn new(components: Vec<i32>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[i32; N]> for DiscreteState {
    fn from(components: [i32; N]) -> Self {
        Self(components.to_vec())
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str(")")
    }
}

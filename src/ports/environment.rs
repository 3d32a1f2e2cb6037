//! Environment port - the game the agents learn to play

use crate::{
    Result,
    types::{Action, GameState},
};

/// A side-scrolling game stepped one frame at a time.
///
/// Rewards are configured when the environment is built, so the same trait
/// serves training (shaped rewards) and evaluation (one point per pipe).
pub trait Environment: Send {
    /// Start a new episode.
    fn reset(&mut self) -> Result<()>;

    /// Observation of the current frame.
    fn state(&self) -> GameState;

    /// Apply `action` for one frame and return the reward earned.
    ///
    /// Acting after the game is over does nothing and yields zero reward.
    fn act(&mut self, action: Action) -> f64;

    /// Whether the current episode has ended.
    fn is_game_over(&self) -> bool;

    /// Pipes passed in the current episode.
    fn score(&self) -> u32;

    /// Frames elapsed in the current episode.
    fn frame(&self) -> u64;
}

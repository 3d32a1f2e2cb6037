//! Learner port - abstraction over the different agent variants
//!
//! Every agent (tabular Q-learning, Monte Carlo control, linear Q-learning)
//! plugs into the training pipeline through this trait, so the frame loop
//! exists exactly once.

use crate::{
    Result,
    types::{Action, GameState, RewardValues, Transition},
};

/// Learner trait - unified interface for all agent variants
///
/// # Call Sequence
///
/// During training, once per frame:
/// 1. `training_action(state)` picks an action (may explore)
/// 2. the environment is stepped
/// 3. `observe(transition)` lets the learner update its estimates
///
/// When a transition is terminal, `end_episode()` follows the `observe` call.
/// During evaluation only `greedy_action` is called.
///
/// # Examples
///
/// ```no_run
/// use flappy_rl::{ports::Learner, types::GameState};
///
/// fn first_move(agent: &mut dyn Learner) -> flappy_rl::types::Action {
///     agent.greedy_action(&GameState::default())
/// }
/// ```
pub trait Learner: Send {
    /// Rewards the environment should hand out while this learner trains.
    ///
    /// Evaluation always uses [`RewardValues::evaluation`].
    fn reward_values(&self) -> RewardValues {
        RewardValues::default()
    }

    /// Action to take while training (epsilon-greedy).
    fn training_action(&mut self, state: &GameState) -> Action;

    /// Action to take once training is complete.
    ///
    /// Takes `&mut self` because ties between equally valued actions are
    /// broken with the learner's random number generator.
    fn greedy_action(&mut self, state: &GameState) -> Action;

    /// Update estimates from one observed transition.
    fn observe(&mut self, transition: &Transition) -> Result<()>;

    /// Called after the terminal transition of each training episode.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn end_episode(&mut self) -> Result<()> {
        Ok(())
    }

    /// Learner name, used in logs and summaries.
    fn name(&self) -> &str;

    /// Forget everything learned and restore the initial exploration rate.
    fn reset(&mut self) -> Result<()>;

    /// Enable downcasting to concrete types (used for serialization).
    fn as_any(&self) -> &dyn std::any::Any;

    /// Current value estimates `[flap, noop]` for a state, if the learner has any.
    fn action_values(&self, _state: &GameState) -> Option<[f64; 2]> {
        None
    }

    /// Seed the learner's random number generator.
    ///
    /// # Default Implementation
    ///
    /// Does nothing and returns `Ok(())`.
    fn set_rng_seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }

    /// Current exploration rate, if the learner explores.
    fn epsilon(&self) -> Option<f64> {
        None
    }
}

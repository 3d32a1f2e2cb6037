//! Tabular Q-learning agent
//!
//! Discretizes each observation with a [`StateEncoder`](crate::discretize::StateEncoder)
//! and learns a Q-table with off-policy one-step updates.

use std::any::Any;

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    discretize::EncoderKind,
    exploration::{EpsilonSchedule, argmax_action, build_rng, random_action},
    ports::Learner,
    q_learning::q_table::{QInit, QTable},
    types::{Action, DiscreteState, GameState, RewardValues, Transition},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TabularAgentState {
    pub q_table: QTable,
    pub encoder: EncoderKind,
    pub schedule: EpsilonSchedule,
    pub rewards: RewardValues,
    pub rng_seed: Option<u64>,
}

/// Q-learning agent (off-policy TD control)
///
/// Learns the optimal Q* function by always updating toward the maximum
/// next-state value, regardless of the action actually taken.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    q_table: QTable,
    encoder: EncoderKind,
    schedule: EpsilonSchedule,
    rewards: RewardValues,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl QLearningAgent {
    /// Create a new Q-learning agent
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - α parameter (0.0 to 1.0)
    /// * `discount_factor` - γ parameter (0.0 to 1.0)
    /// * `schedule` - Exploration rate and its per-episode decay
    /// * `q_init` - Initial Q-value for unseen states
    pub fn new(
        learning_rate: f64,
        discount_factor: f64,
        schedule: EpsilonSchedule,
        q_init: QInit,
    ) -> Self {
        Self {
            q_table: QTable::new(learning_rate, discount_factor, q_init),
            encoder: EncoderKind::default(),
            schedule,
            rewards: RewardValues::new(1.0, 0.0, -100.0),
            rng: build_rng(None),
            rng_seed: None,
        }
    }

    pub fn with_encoder(mut self, encoder: EncoderKind) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardValues) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn encoder(&self) -> EncoderKind {
        self.encoder
    }

    pub fn encode(&self, state: &GameState) -> DiscreteState {
        self.encoder.encode(state)
    }

    pub(crate) fn export_state(&self) -> TabularAgentState {
        TabularAgentState {
            q_table: self.q_table.clone(),
            encoder: self.encoder,
            schedule: self.schedule,
            rewards: self.rewards,
            rng_seed: self.rng_seed,
        }
    }

    pub(crate) fn from_state(state: TabularAgentState) -> Self {
        Self {
            q_table: state.q_table,
            encoder: state.encoder,
            schedule: state.schedule,
            rewards: state.rewards,
            rng: build_rng(state.rng_seed),
            rng_seed: state.rng_seed,
        }
    }

    fn reset_rng(&mut self) {
        self.rng = build_rng(self.rng_seed);
    }
}

impl Learner for QLearningAgent {
    fn reward_values(&self) -> RewardValues {
        self.rewards
    }

    fn training_action(&mut self, state: &GameState) -> Action {
        if self.schedule.explore(&mut self.rng) {
            random_action(&mut self.rng)
        } else {
            self.greedy_action(state)
        }
    }

    fn greedy_action(&mut self, state: &GameState) -> Action {
        let key = self.encode(state);
        argmax_action(self.q_table.values(&key), &mut self.rng)
    }

    fn observe(&mut self, transition: &Transition) -> Result<()> {
        let key = self.encode(&transition.state);
        self.q_table.touch(&key, &mut self.rng);

        let next_key = self.encode(&transition.next_state);
        if !transition.terminal {
            self.q_table.touch(&next_key, &mut self.rng);
        }

        self.q_table.q_learning_update(
            key,
            transition.action,
            transition.reward,
            &next_key,
            transition.terminal,
        );
        Ok(())
    }

    fn end_episode(&mut self) -> Result<()> {
        self.schedule.decay();
        Ok(())
    }

    fn name(&self) -> &str {
        "Q-Learning"
    }

    fn reset(&mut self) -> Result<()> {
        self.q_table.reset();
        self.schedule.reset();
        self.reset_rng();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn action_values(&self, state: &GameState) -> Option<[f64; 2]> {
        Some(self.q_table.values(&self.encode(state)))
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        Ok(())
    }

    fn epsilon(&self) -> Option<f64> {
        Some(self.schedule.epsilon)
    }
}

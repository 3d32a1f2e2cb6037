//! Linear function approximation
//!
//! Q(s,a) = w_a · φ(s), with one weight vector per action and semi-gradient
//! Q-learning updates:
//!
//! w_a ← w_a + α[r + γ max_a' Q(s',a') - Q(s,a)] φ(s)

use std::any::Any;

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Error, Result,
    exploration::{EpsilonSchedule, argmax_action, build_rng, random_action},
    features::FeatureSet,
    ports::Learner,
    types::{Action, GameState, RewardValues, Transition},
};

/// Weight vectors for both actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearWeights {
    weights: [Vec<f64>; 2],
}

impl LinearWeights {
    /// Zero weights of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            weights: [vec![0.0; len], vec![0.0; len]],
        }
    }

    pub fn for_action(&self, action: Action) -> &[f64] {
        &self.weights[action.index()]
    }

    pub fn len(&self) -> usize {
        self.weights[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights[0].is_empty()
    }

    /// w_a · φ
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureLengthMismatch`] when `features` has the wrong length.
    pub fn value(&self, action: Action, features: &[f64]) -> Result<f64> {
        self.check_len(features)?;
        Ok(self.weights[action.index()]
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum())
    }

    pub fn values(&self, features: &[f64]) -> Result<[f64; 2]> {
        Ok([
            self.value(Action::Flap, features)?,
            self.value(Action::Noop, features)?,
        ])
    }

    /// w_a ← w_a + step·φ
    pub fn step(&mut self, action: Action, features: &[f64], step: f64) -> Result<()> {
        self.check_len(features)?;
        for (w, x) in self.weights[action.index()].iter_mut().zip(features) {
            *w += step * x;
        }
        Ok(())
    }

    /// Both vectors must hold exactly `len` weights.
    fn check_shape(&self, len: usize) -> Result<()> {
        for weights in &self.weights {
            if weights.len() != len {
                return Err(Error::FeatureLengthMismatch {
                    expected: len,
                    got: weights.len(),
                });
            }
        }
        Ok(())
    }

    fn check_len(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.len() {
            return Err(Error::FeatureLengthMismatch {
                expected: self.len(),
                got: features.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LinearAgentState {
    pub weights: LinearWeights,
    pub features: FeatureSet,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub schedule: EpsilonSchedule,
    pub rewards: RewardValues,
    pub rng_seed: Option<u64>,
}

/// Q-learning with a linear value function per action
#[derive(Debug, Clone)]
pub struct LinearAgent {
    weights: LinearWeights,
    features: FeatureSet,
    learning_rate: f64,
    discount_factor: f64,
    schedule: EpsilonSchedule,
    rewards: RewardValues,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl LinearAgent {
    pub fn new(
        features: FeatureSet,
        learning_rate: f64,
        discount_factor: f64,
        schedule: EpsilonSchedule,
    ) -> Self {
        Self {
            weights: LinearWeights::zeros(features.len()),
            features,
            learning_rate,
            discount_factor,
            schedule,
            rewards: RewardValues::default(),
            rng: build_rng(None),
            rng_seed: None,
        }
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

    pub fn weights(&self) -> &LinearWeights {
        &self.weights
    }

    pub fn feature_set(&self) -> FeatureSet {
        self.features
    }

    fn q_values(&self, state: &GameState) -> Result<[f64; 2]> {
        self.weights.values(&self.features.features(state))
    }

    pub(crate) fn export_state(&self) -> LinearAgentState {
        LinearAgentState {
            weights: self.weights.clone(),
            features: self.features,
            learning_rate: self.learning_rate,
            discount_factor: self.discount_factor,
            schedule: self.schedule,
            rewards: self.rewards,
            rng_seed: self.rng_seed,
        }
    }

    pub(crate) fn from_state(state: LinearAgentState) -> Result<Self> {
        state.weights.check_shape(state.features.len())?;
        Ok(Self {
            weights: state.weights,
            features: state.features,
            learning_rate: state.learning_rate,
            discount_factor: state.discount_factor,
            schedule: state.schedule,
            rewards: state.rewards,
            rng: build_rng(state.rng_seed),
            rng_seed: state.rng_seed,
        })
    }
}

impl Learner for LinearAgent {
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
        match self.q_values(state) {
            Ok(values) => argmax_action(values, &mut self.rng),
            Err(err) => {
                warn!(%err, "cannot evaluate linear values, acting randomly");
                random_action(&mut self.rng)
            }
        }
    }

    fn observe(&mut self, transition: &Transition) -> Result<()> {
        let max_next_q = if transition.terminal {
            0.0
        } else {
            let [flap, noop] = self.q_values(&transition.next_state)?;
            flap.max(noop)
        };

        let phi = self.features.features(&transition.state);
        let current_q = self.weights.value(transition.action, &phi)?;
        let td_error = transition.reward + self.discount_factor * max_next_q - current_q;
        self.weights
            .step(transition.action, &phi, self.learning_rate * td_error)
    }

    fn end_episode(&mut self) -> Result<()> {
        self.schedule.decay();
        Ok(())
    }

    fn name(&self) -> &str {
        "Linear Q-Learning"
    }

    fn reset(&mut self) -> Result<()> {
        self.weights = LinearWeights::zeros(self.features.len());
        self.schedule.reset();
        self.rng = build_rng(self.rng_seed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn action_values(&self, state: &GameState) -> Option<[f64; 2]> {
        self.q_values(state).ok()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> GameState {
        GameState {
            player_y: 200.0,
            player_vel: 3.0,
            next_pipe_top_y: 150.0,
            next_pipe_dist_to_player: 100.0,
            ..GameState::default()
        }
    }

    #[test]
    fn test_weights_dot_product() {
        let mut weights = LinearWeights::zeros(3);
        weights.step(Action::Noop, &[1.0, 2.0, 0.0], 0.5).unwrap();
        assert_eq!(weights.for_action(Action::Noop), &[0.5, 1.0, 0.0]);
        assert_eq!(weights.value(Action::Noop, &[1.0, 1.0, 1.0]).unwrap(), 1.5);
        assert_eq!(weights.value(Action::Flap, &[1.0, 1.0, 1.0]).unwrap(), 0.0);
        assert!(weights.value(Action::Flap, &[1.0]).is_err());
    }

    #[test]
    fn test_terminal_update_moves_active_features() {
        let mut agent =
            LinearAgent::new(FeatureSet::Binned, 0.1, 1.0, EpsilonSchedule::constant(0.0))
                .with_seed(2);
        let s = sample_state();
        agent
            .observe(&Transition {
                state: s,
                action: Action::Flap,
                reward: -5.0,
                next_state: s,
                terminal: true,
            })
            .unwrap();

        // Three active features, each moved by 0.1 * -5
        let flap = agent.weights().for_action(Action::Flap);
        assert_eq!(flap.iter().filter(|w| **w != 0.0).count(), 3);
        assert!(flap.iter().all(|w| *w == 0.0 || (*w + 0.5).abs() < 1e-12));

        // Q(s, flap) = 3 * -0.5
        let values = agent.action_values(&s).unwrap();
        assert!((values[0] + 1.5).abs() < 1e-12);
        assert_eq!(agent.greedy_action(&s), Action::Noop);
    }

    #[test]
    fn test_bootstraps_from_next_state() {
        let mut agent =
            LinearAgent::new(FeatureSet::Binned, 0.5, 1.0, EpsilonSchedule::constant(0.0));
        let s = sample_state();
        let mut next = s;
        next.player_y = 400.0;

        let next_phi = FeatureSet::Binned.features(&next);
        agent.weights.step(Action::Noop, &next_phi, 1.0).unwrap();

        agent
            .observe(&Transition {
                state: s,
                action: Action::Flap,
                reward: 0.0,
                next_state: next,
                terminal: false,
            })
            .unwrap();

        // max Q(s') = 3 (three active features with weight 1), current = 0
        let phi = FeatureSet::Binned.features(&s);
        let q = agent.weights().value(Action::Flap, &phi).unwrap();
        assert!((q - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_state_rejects_mismatched_weights() {
        let agent = LinearAgent::new(FeatureSet::Raw, 0.1, 1.0, EpsilonSchedule::default());
        let mut state = agent.export_state();
        state.features = FeatureSet::Binned;
        assert!(LinearAgent::from_state(state).is_err());
    }

    #[test]
    fn test_from_state_rejects_short_noop_weights() {
        let agent = LinearAgent::new(FeatureSet::Raw, 0.1, 1.0, EpsilonSchedule::default());
        let mut state = agent.export_state();
        state.weights.weights[Action::Noop.index()].pop();
        assert!(matches!(
            LinearAgent::from_state(state),
            Err(Error::FeatureLengthMismatch {
                expected: 5,
                got: 4
            })
        ));
    }
}

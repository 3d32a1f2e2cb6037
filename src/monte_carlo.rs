//! Monte Carlo control
//!
//! Visited state-action pairs are buffered for the length of an episode. When
//! the episode ends, the return following the first visit of every pair is
//! folded into a per-pair running average, and that average becomes the
//! pair's value estimate.

use std::{
    any::Any,
    collections::{HashMap, HashSet},
};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    discretize::EncoderKind,
    exploration::{EpsilonSchedule, argmax_action, build_rng, random_action},
    ports::Learner,
    types::{Action, DiscreteState, GameState, RewardValues, Transition},
};

pub type StateAction = (DiscreteState, Action);

/// Rewards observed during the current episode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeBuffer {
    steps: Vec<(StateAction, f64)>,
}

impl EpisodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: StateAction, reward: f64) {
        self.steps.push((key, reward));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// First-visit returns, in order of first visit; empties the buffer.
    pub fn drain_returns(&mut self, discount_factor: f64) -> Vec<(StateAction, f64)> {
        let steps = std::mem::take(&mut self.steps);

        let mut returns = vec![0.0; steps.len()];
        let mut g = 0.0;
        for (i, (_, reward)) in steps.iter().enumerate().rev() {
            g = reward + discount_factor * g;
            returns[i] = g;
        }

        let mut seen = HashSet::with_capacity(steps.len());
        let mut first_visits = Vec::new();
        for (i, (key, _)) in steps.into_iter().enumerate() {
            if seen.insert(key.clone()) {
                first_visits.push((key, returns[i]));
            }
        }
        first_visits
    }
}

/// Running sum and count of observed returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMean {
    pub sum: f64,
    pub count: u64,
}

impl RunningMean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of the pushed values, `None` before the first one.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per state-action return averages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnAverages {
    averages: HashMap<StateAction, RunningMean>,
}

impl ReturnAverages {
    pub fn record(&mut self, key: StateAction, value: f64) {
        self.averages.entry(key).or_default().push(value);
    }

    pub fn mean(&self, state: &DiscreteState, action: Action) -> Option<f64> {
        self.averages
            .get(&(state.clone(), action))
            .and_then(RunningMean::mean)
    }

    pub fn get(&self, state: &DiscreteState, action: Action) -> Option<&RunningMean> {
        self.averages.get(&(state.clone(), action))
    }

    /// Number of state-action pairs with at least one return.
    pub fn len(&self) -> usize {
        self.averages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }

    /// Distinct states with at least one recorded action.
    pub fn states(&self) -> Vec<DiscreteState> {
        let mut states: Vec<DiscreteState> =
            self.averages.keys().map(|(state, _)| state.clone()).collect();
        states.sort();
        states.dedup();
        states
    }

    pub fn clear(&mut self) {
        self.averages.clear();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MonteCarloState {
    pub averages: ReturnAverages,
    pub encoder: EncoderKind,
    pub discount_factor: f64,
    pub schedule: EpsilonSchedule,
    pub rewards: RewardValues,
    pub rng_seed: Option<u64>,
}

/// First-visit Monte Carlo control agent
#[derive(Debug, Clone)]
pub struct MonteCarloAgent {
    averages: ReturnAverages,
    episode: EpisodeBuffer,
    encoder: EncoderKind,
    discount_factor: f64,
    schedule: EpsilonSchedule,
    rewards: RewardValues,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl MonteCarloAgent {
    pub fn new(discount_factor: f64, schedule: EpsilonSchedule) -> Self {
        Self {
            averages: ReturnAverages::default(),
            episode: EpisodeBuffer::new(),
            encoder: EncoderKind::BirdGrid,
            discount_factor,
            schedule,
            rewards: RewardValues::default(),
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

    pub fn averages(&self) -> &ReturnAverages {
        &self.averages
    }

    pub fn encoder(&self) -> EncoderKind {
        self.encoder
    }

    /// Pairs recorded in the episode still in progress.
    pub fn pending_steps(&self) -> usize {
        self.episode.len()
    }

    /// Estimated values `[flap, noop]` with `None` for pairs never visited.
    pub fn known_values(&self, state: &DiscreteState) -> [Option<f64>; 2] {
        Action::ALL.map(|action| self.averages.mean(state, action))
    }

    fn finish_episode(&mut self) {
        for (key, g) in self.episode.drain_returns(self.discount_factor) {
            self.averages.record(key, g);
        }
    }

    pub(crate) fn export_state(&self) -> MonteCarloState {
        MonteCarloState {
            averages: self.averages.clone(),
            encoder: self.encoder,
            discount_factor: self.discount_factor,
            schedule: self.schedule,
            rewards: self.rewards,
            rng_seed: self.rng_seed,
        }
    }

    pub(crate) fn from_state(state: MonteCarloState) -> Self {
        Self {
            averages: state.averages,
            episode: EpisodeBuffer::new(),
            encoder: state.encoder,
            discount_factor: state.discount_factor,
            schedule: state.schedule,
            rewards: state.rewards,
            rng: build_rng(state.rng_seed),
            rng_seed: state.rng_seed,
        }
    }
}

impl Learner for MonteCarloAgent {
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
        let key = self.encoder.encode(state);
        match self.known_values(&key) {
            [Some(flap), Some(noop)] => argmax_action([flap, noop], &mut self.rng),
            [Some(_), None] => Action::Flap,
            [None, Some(_)] => Action::Noop,
            [None, None] => random_action(&mut self.rng),
        }
    }

    fn observe(&mut self, transition: &Transition) -> Result<()> {
        let key = self.encoder.encode(&transition.state);
        self.episode
            .record((key, transition.action), transition.reward);
        if transition.terminal {
            self.finish_episode();
        }
        Ok(())
    }

    fn end_episode(&mut self) -> Result<()> {
        self.schedule.decay();
        Ok(())
    }

    fn name(&self) -> &str {
        "Monte Carlo"
    }

    fn reset(&mut self) -> Result<()> {
        self.averages.clear();
        self.episode = EpisodeBuffer::new();
        self.schedule.reset();
        self.rng = build_rng(self.rng_seed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn action_values(&self, state: &GameState) -> Option<[f64; 2]> {
        match self.known_values(&self.encoder.encode(state)) {
            [None, None] => None,
            [flap, noop] => Some([flap.unwrap_or(0.0), noop.unwrap_or(0.0)]),
        }
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

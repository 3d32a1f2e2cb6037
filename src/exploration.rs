//! Epsilon-greedy exploration shared by all agents

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::types::Action;

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Uniformly random action.
pub fn random_action<R: Rng + ?Sized>(rng: &mut R) -> Action {
    if rng.random_bool(0.5) {
        Action::Flap
    } else {
        Action::Noop
    }
}

/// Action with the larger value; ties are broken uniformly at random.
pub fn argmax_action<R: Rng + ?Sized>(values: [f64; 2], rng: &mut R) -> Action {
    preferred_action(values).unwrap_or_else(|| random_action(rng))
}

/// Action with the strictly larger value, `None` on a tie.
pub fn preferred_action(values: [f64; 2]) -> Option<Action> {
    let [flap, noop] = values;
    if flap > noop {
        Some(Action::Flap)
    } else if noop > flap {
        Some(Action::Noop)
    } else {
        None
    }
}

/// Exploration rate with multiplicative per-episode decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub epsilon: f64,
    pub initial_epsilon: f64,
    pub decay: f64,
    pub min_epsilon: f64,
}

impl EpsilonSchedule {
    pub fn new(epsilon: f64, decay: f64, min_epsilon: f64) -> Self {
        Self {
            epsilon,
            initial_epsilon: epsilon,
            decay,
            min_epsilon,
        }
    }

    /// Fixed exploration rate.
    pub fn constant(epsilon: f64) -> Self {
        Self::new(epsilon, 1.0, epsilon)
    }

    /// Whether the next action should be random.
    pub fn explore<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.random::<f64>() < self.epsilon
    }

    /// Decay epsilon after an episode.
    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.decay).max(self.min_epsilon);
    }

    pub fn reset(&mut self) {
        self.epsilon = self.initial_epsilon;
    }
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self::constant(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_action() {
        assert_eq!(preferred_action([1.0, 0.0]), Some(Action::Flap));
        assert_eq!(preferred_action([-1.0, 0.0]), Some(Action::Noop));
        assert_eq!(preferred_action([0.5, 0.5]), None);
    }

    #[test]
    fn test_argmax_ties_pick_both_actions() {
        let mut rng = build_rng(Some(3));
        let picks: Vec<Action> = (0..64).map(|_| argmax_action([0.0, 0.0], &mut rng)).collect();
        assert!(picks.contains(&Action::Flap));
        assert!(picks.contains(&Action::Noop));
    }

    #[test]
    fn test_epsilon_decay_respects_floor() {
        let mut schedule = EpsilonSchedule::new(0.5, 0.5, 0.1);
        schedule.decay();
        assert_eq!(schedule.epsilon, 0.25);
        schedule.decay();
        schedule.decay();
        assert_eq!(schedule.epsilon, 0.1);
        schedule.reset();
        assert_eq!(schedule.epsilon, 0.5);
    }

    #[test]
    fn test_zero_epsilon_never_explores() {
        let schedule = EpsilonSchedule::constant(0.0);
        let mut rng = build_rng(Some(1));
        assert!((0..1000).all(|_| !schedule.explore(&mut rng)));
    }
}

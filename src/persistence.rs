//! Agent serialization support
//!
//! A [`SavedAgent`] bundles the learned values of any agent variant with the
//! metadata of the run that produced it, including the score history.

use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    discretize::EncoderKind,
    features::FeatureSet,
    linear::{LinearAgent, LinearAgentState},
    monte_carlo::{MonteCarloAgent, MonteCarloState},
    ports::Learner,
    q_learning::{QLearningAgent, TabularAgentState},
};

/// Supported agent variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    QLearning,
    MonteCarlo,
    Linear,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::QLearning, AgentKind::MonteCarlo, AgentKind::Linear];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::QLearning => "q-learning",
            AgentKind::MonteCarlo => "monte-carlo",
            AgentKind::Linear => "linear",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "q-learning" | "qlearning" | "q" => Ok(AgentKind::QLearning),
            "monte-carlo" | "montecarlo" | "mc" => Ok(AgentKind::MonteCarlo),
            "linear" | "linear-fa" => Ok(AgentKind::Linear),
            _ => Err(Error::ParseAgentKind {
                input: s.to_string(),
                expected: "q-learning, monte-carlo, linear".to_string(),
            }),
        }
    }
}

/// Learned state of one agent variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum AgentSnapshot {
    QLearning(TabularAgentState),
    MonteCarlo(MonteCarloState),
    Linear(LinearAgentState),
}

/// Metadata about the training process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Episodes trained across all runs
    pub episodes_trained: usize,
    /// Random seed used (if any)
    pub seed: Option<u64>,
    /// Seconds since the Unix epoch when saved
    pub saved_at: Option<u64>,
    /// State encoder or feature set, by name
    pub representation: Option<String>,
    /// Pipes passed in every training episode, in order
    pub scores: Vec<f64>,
}

impl TrainingMetadata {
    /// Stamp the metadata with the current time.
    pub fn stamped(mut self) -> Self {
        self.saved_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs());
        self
    }
}

/// Serializable representation of a trained agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAgent {
    /// Version of the save format
    pub version: u32,
    pub kind: AgentKind,
    snapshot: AgentSnapshot,
    pub metadata: TrainingMetadata,
}

impl SavedAgent {
    /// Current save format version
    pub const VERSION: u32 = 1;

    /// Capture the state of a learner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedLearner`] if `learner` is not one of the
    /// crate's agent types.
    pub fn from_learner(learner: &dyn Learner, metadata: TrainingMetadata) -> Result<Self> {
        let any = learner.as_any();
        let (kind, snapshot) = if let Some(agent) = any.downcast_ref::<QLearningAgent>() {
            (AgentKind::QLearning, AgentSnapshot::QLearning(agent.export_state()))
        } else if let Some(agent) = any.downcast_ref::<MonteCarloAgent>() {
            (AgentKind::MonteCarlo, AgentSnapshot::MonteCarlo(agent.export_state()))
        } else if let Some(agent) = any.downcast_ref::<LinearAgent>() {
            (AgentKind::Linear, AgentSnapshot::Linear(agent.export_state()))
        } else {
            return Err(Error::UnsupportedLearner {
                name: learner.name().to_string(),
            });
        };

        Ok(Self {
            version: Self::VERSION,
            kind,
            snapshot,
            metadata,
        })
    }

    /// Rebuild the learner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] for files written by another
    /// format version, or an error if the stored weights are inconsistent.
    pub fn to_learner(&self) -> Result<Box<dyn Learner>> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }

        Ok(match &self.snapshot {
            AgentSnapshot::QLearning(state) => Box::new(QLearningAgent::from_state(state.clone())),
            AgentSnapshot::MonteCarlo(state) => {
                Box::new(MonteCarloAgent::from_state(state.clone()))
            }
            AgentSnapshot::Linear(state) => Box::new(LinearAgent::from_state(state.clone())?),
        })
    }

    /// Check that this file holds an agent of `kind`.
    pub fn ensure_kind(&self, kind: AgentKind) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(Error::AgentKindMismatch {
                expected: kind.to_string(),
                found: self.kind.to_string(),
            })
        }
    }

    /// State encoder of the tabular agents.
    pub fn encoder(&self) -> Option<EncoderKind> {
        match &self.snapshot {
            AgentSnapshot::QLearning(state) => Some(state.encoder),
            AgentSnapshot::MonteCarlo(state) => Some(state.encoder),
            AgentSnapshot::Linear(_) => None,
        }
    }

    /// Feature set of a linear agent.
    pub fn feature_set(&self) -> Option<FeatureSet> {
        match &self.snapshot {
            AgentSnapshot::Linear(state) => Some(state.features),
            _ => None,
        }
    }

    /// Representation name recorded alongside the scores.
    pub fn representation(&self) -> String {
        match (self.encoder(), self.feature_set()) {
            (Some(encoder), _) => encoder.to_string(),
            (None, Some(features)) => features.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Q-table of a tabular agent.
    pub fn q_table(&self) -> Option<&crate::q_learning::QTable> {
        match &self.snapshot {
            AgentSnapshot::QLearning(state) => Some(&state.q_table),
            _ => None,
        }
    }

    /// Return averages of a Monte Carlo agent.
    pub fn return_averages(&self) -> Option<&crate::monte_carlo::ReturnAverages> {
        match &self.snapshot {
            AgentSnapshot::MonteCarlo(state) => Some(&state.averages),
            _ => None,
        }
    }

    /// Weights of a linear agent.
    pub fn linear_weights(&self) -> Option<&crate::linear::LinearWeights> {
        match &self.snapshot {
            AgentSnapshot::Linear(state) => Some(&state.weights),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        exploration::EpsilonSchedule,
        q_learning::QInit,
        types::{Action, GameState, Transition},
    };

    fn crash(learner: &mut dyn Learner) {
        let state = GameState {
            player_y: 380.0,
            next_pipe_top_y: 120.0,
            next_pipe_dist_to_player: 90.0,
            ..GameState::default()
        };
        learner
            .observe(&Transition {
                state,
                action: Action::Noop,
                reward: -5.0,
                next_state: state,
                terminal: true,
            })
            .unwrap();
    }

    #[test]
    fn test_q_learning_roundtrip() {
        let mut agent =
            QLearningAgent::new(0.5, 1.0, EpsilonSchedule::constant(0.1), QInit::default())
                .with_seed(7);
        crash(&mut agent);

        let saved = SavedAgent::from_learner(&agent, TrainingMetadata::default()).unwrap();
        let bytes = rmp_serde::to_vec(&saved).unwrap();
        let loaded: SavedAgent = rmp_serde::from_slice(&bytes).unwrap();

        assert_eq!(loaded.kind, AgentKind::QLearning);
        assert_eq!(loaded.q_table().unwrap().len(), agent.q_table().len());
        let restored = loaded.to_learner().unwrap();
        assert_eq!(restored.name(), "Q-Learning");
    }

    #[test]
    fn test_linear_roundtrip_keeps_weights() {
        let mut agent =
            LinearAgent::new(FeatureSet::Binned, 0.1, 1.0, EpsilonSchedule::constant(0.0));
        crash(&mut agent);

        let saved = SavedAgent::from_learner(&agent, TrainingMetadata::default()).unwrap();
        let bytes = rmp_serde::to_vec(&saved).unwrap();
        let loaded: SavedAgent = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(loaded.linear_weights(), Some(agent.weights()));
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let agent = MonteCarloAgent::new(1.0, EpsilonSchedule::default());
        let mut saved = SavedAgent::from_learner(&agent, TrainingMetadata::default()).unwrap();
        saved.version = 99;
        assert!(matches!(
            saved.to_learner(),
            Err(Error::UnsupportedVersion {
                found: 99,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_ensure_kind() {
        let agent = MonteCarloAgent::new(1.0, EpsilonSchedule::default());
        let saved = SavedAgent::from_learner(&agent, TrainingMetadata::default()).unwrap();
        assert!(saved.ensure_kind(AgentKind::MonteCarlo).is_ok());
        assert!(matches!(
            saved.ensure_kind(AgentKind::Linear),
            Err(Error::AgentKindMismatch { .. })
        ));
    }

    #[test]
    fn test_agent_kind_parsing() {
        assert_eq!("mc".parse::<AgentKind>().unwrap(), AgentKind::MonteCarlo);
        assert_eq!("Q_Learning".parse::<AgentKind>().unwrap(), AgentKind::QLearning);
        assert!("sarsa".parse::<AgentKind>().is_err());
        for kind in AgentKind::ALL {
            assert_eq!(kind.to_string().parse::<AgentKind>().unwrap(), kind);
        }
    }
}

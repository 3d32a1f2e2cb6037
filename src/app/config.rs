//! Configuration types for agent creation.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Error, Result,
    discretize::EncoderKind,
    exploration::EpsilonSchedule,
    features::FeatureSet,
    persistence::AgentKind,
    q_learning::QInit,
    types::RewardValues,
};

/// Read a JSON config file into any serde-backed config type.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| Error::Io {
        operation: format!("open config file {path:?}"),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Configuration for creating an agent.
///
/// Every field has a per-kind default, so a JSON config only needs the
/// values it changes.
///
/// # Examples
///
/// ```
/// use flappy_rl::app::AgentConfig;
/// use flappy_rl::discretize::EncoderKind;
/// use flappy_rl::persistence::AgentKind;
///
/// let config = AgentConfig::new(AgentKind::QLearning)
///     .with_encoder(EncoderKind::PipeGrid)
///     .with_learning_rate(0.5)
///     .with_seed(42);
/// assert_eq!(config.rewards.loss, -100.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub kind: AgentKind,
    /// State discretization for the tabular agents
    pub encoder: EncoderKind,
    /// Feature vectors for the linear agent
    pub features: FeatureSet,
    /// Step size α (unused by Monte Carlo)
    pub learning_rate: f64,
    /// Discount factor γ
    pub discount_factor: f64,
    pub epsilon: f64,
    /// Multiplicative per-episode epsilon decay (1.0 keeps it constant)
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
    /// Initial value of unseen Q-table entries
    pub q_init: QInit,
    /// Rewards handed out during training
    pub rewards: RewardValues,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

#[derive(Deserialize)]
struct PartialAgentConfig {
    kind: AgentKind,
    encoder: Option<EncoderKind>,
    features: Option<FeatureSet>,
    learning_rate: Option<f64>,
    discount_factor: Option<f64>,
    epsilon: Option<f64>,
    epsilon_decay: Option<f64>,
    min_epsilon: Option<f64>,
    q_init: Option<QInit>,
    rewards: Option<RewardValues>,
    seed: Option<u64>,
}

impl AgentConfig {
    /// Defaults for `kind`:
    /// - Q-learning: gap-offset encoder, α = 0.1, loss reward -100
    /// - Monte Carlo: bird-grid encoder, loss reward -5
    /// - Linear: binned features, α = 0.1, loss reward -5
    ///
    /// All kinds start with γ = 1 and a constant ε = 0.1.
    pub fn new(kind: AgentKind) -> Self {
        let (encoder, rewards) = match kind {
            AgentKind::QLearning => (EncoderKind::GapOffset, RewardValues::new(1.0, 0.0, -100.0)),
            AgentKind::MonteCarlo => (EncoderKind::BirdGrid, RewardValues::default()),
            AgentKind::Linear => (EncoderKind::default(), RewardValues::default()),
        };
        Self {
            kind,
            encoder,
            features: FeatureSet::default(),
            learning_rate: 0.1,
            discount_factor: 1.0,
            epsilon: 0.1,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            q_init: QInit::default(),
            rewards,
            seed: None,
        }
    }

    /// Load a config from JSON, filling omitted fields with the defaults of its kind.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let partial: PartialAgentConfig = load_json(path)?;
        let defaults = Self::new(partial.kind);
        let config = Self {
            kind: partial.kind,
            encoder: partial.encoder.unwrap_or(defaults.encoder),
            features: partial.features.unwrap_or(defaults.features),
            learning_rate: partial.learning_rate.unwrap_or(defaults.learning_rate),
            discount_factor: partial.discount_factor.unwrap_or(defaults.discount_factor),
            epsilon: partial.epsilon.unwrap_or(defaults.epsilon),
            epsilon_decay: partial.epsilon_decay.unwrap_or(defaults.epsilon_decay),
            min_epsilon: partial.min_epsilon.unwrap_or(defaults.min_epsilon),
            q_init: partial.q_init.unwrap_or(defaults.q_init),
            rewards: partial.rewards.unwrap_or(defaults.rewards),
            seed: partial.seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_encoder(mut self, encoder: EncoderKind) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    /// Set the exploration schedule.
    pub fn with_epsilon(mut self, epsilon: f64, decay: f64, min_epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self.epsilon_decay = decay;
        self.min_epsilon = min_epsilon;
        self
    }

    pub fn with_q_init(mut self, q_init: QInit) -> Self {
        self.q_init = q_init;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardValues) -> Self {
        self.rewards = rewards;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn schedule(&self) -> EpsilonSchedule {
        EpsilonSchedule::new(self.epsilon, self.epsilon_decay, self.min_epsilon)
    }

    /// Check hyperparameter ranges.
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("learning_rate", self.learning_rate),
            ("discount_factor", self.discount_factor),
            ("epsilon", self.epsilon),
            ("epsilon_decay", self.epsilon_decay),
            ("min_epsilon", self.min_epsilon),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be in [0, 1], got {value}"),
                });
            }
        }
        if self.min_epsilon > self.epsilon {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "min_epsilon {} exceeds epsilon {}",
                    self.min_epsilon, self.epsilon
                ),
            });
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(AgentKind::QLearning)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_per_kind_defaults() {
        assert_eq!(AgentConfig::new(AgentKind::QLearning).rewards.loss, -100.0);
        let mc = AgentConfig::new(AgentKind::MonteCarlo);
        assert_eq!(mc.encoder, EncoderKind::BirdGrid);
        assert_eq!(mc.rewards.loss, -5.0);
    }

    #[test]
    fn test_partial_json_uses_kind_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(
            &path,
            r#"{"kind": "monte-carlo", "epsilon": 0.2, "epsilon_decay": 0.99}"#,
        )
        .unwrap();

        let config = AgentConfig::from_json_file(&path).unwrap();
        assert_eq!(config.kind, AgentKind::MonteCarlo);
        assert_eq!(config.encoder, EncoderKind::BirdGrid);
        assert_eq!(config.epsilon, 0.2);
        assert_eq!(config.schedule().decay, 0.99);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = AgentConfig::default().with_learning_rate(1.5);
        assert!(config.validate().is_err());
        let config = AgentConfig::default().with_epsilon(0.1, 1.0, 0.5);
        assert!(config.validate().is_err());
    }
}

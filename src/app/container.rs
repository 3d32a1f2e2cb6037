//! Dependency injection container for the application.
//!
//! The container owns infrastructure dependencies and provides factory
//! methods for learners and courses.

use std::{path::Path, sync::Arc};

use tracing::debug;

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::MsgPackRepository,
    game::{CourseConfig, FlappyCourse},
    linear::LinearAgent,
    monte_carlo::MonteCarloAgent,
    persistence::{AgentKind, SavedAgent, TrainingMetadata},
    ports::{AgentRepository, Learner},
    q_learning::QLearningAgent,
    types::RewardValues,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ```
/// use flappy_rl::app::{AgentConfig, App};
/// use flappy_rl::persistence::AgentKind;
///
/// let app = App::new();
/// let learner = app.create_learner(&AgentConfig::new(AgentKind::Linear).with_seed(42))?;
/// assert_eq!(learner.name(), "Linear Q-Learning");
/// # Ok::<(), flappy_rl::Error>(())
/// ```
pub struct App {
    repository: Arc<dyn AgentRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with the MessagePack repository and no default seed.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    ///
    /// ```
    /// use flappy_rl::adapters::InMemoryRepository;
    /// use flappy_rl::app::App;
    ///
    /// let app = App::for_testing()
    ///     .with_repository(InMemoryRepository::new())
    ///     .with_default_seed(42)
    ///     .build();
    /// ```
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn repository(&self) -> Arc<dyn AgentRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    pub fn default_seed(&self) -> Option<u64> {
        self.default_seed
    }

    /// Build a fresh learner from `config`.
    ///
    /// The config seed wins over the app default.
    pub fn create_learner(&self, config: &AgentConfig) -> Result<Box<dyn Learner>> {
        config.validate()?;
        let seed = config.seed.or(self.default_seed);
        debug!(kind = %config.kind, ?seed, "creating learner");

        let schedule = config.schedule();
        let learner: Box<dyn Learner> = match config.kind {
            AgentKind::QLearning => {
                let mut agent = QLearningAgent::new(
                    config.learning_rate,
                    config.discount_factor,
                    schedule,
                    config.q_init,
                )
                .with_encoder(config.encoder)
                .with_rewards(config.rewards);
                if let Some(seed) = seed {
                    agent = agent.with_seed(seed);
                }
                Box::new(agent)
            }
            AgentKind::MonteCarlo => {
                let mut agent = MonteCarloAgent::new(config.discount_factor, schedule)
                    .with_encoder(config.encoder)
                    .with_rewards(config.rewards);
                if let Some(seed) = seed {
                    agent = agent.with_seed(seed);
                }
                Box::new(agent)
            }
            AgentKind::Linear => {
                let mut agent = LinearAgent::new(
                    config.features,
                    config.learning_rate,
                    config.discount_factor,
                    schedule,
                )
                .with_rewards(config.rewards);
                if let Some(seed) = seed {
                    agent = agent.with_seed(seed);
                }
                Box::new(agent)
            }
        };
        Ok(learner)
    }

    /// Build a course handing out `rewards`.
    ///
    /// Pipe placement is seeded from `seed`, falling back to the app default.
    pub fn create_course(
        &self,
        config: CourseConfig,
        rewards: RewardValues,
        seed: Option<u64>,
    ) -> Result<FlappyCourse> {
        FlappyCourse::new(config, rewards, seed.or(self.default_seed))
    }

    /// Load a saved agent through the configured repository.
    pub fn load_agent(&self, path: &Path) -> Result<SavedAgent> {
        self.repository.load(path)
    }

    /// Capture `learner` with `metadata` and persist it.
    ///
    /// Fills in the save time and, when missing, the representation name.
    pub fn save_learner(
        &self,
        learner: &dyn Learner,
        metadata: TrainingMetadata,
        path: &Path,
    ) -> Result<SavedAgent> {
        let mut saved = SavedAgent::from_learner(learner, metadata.stamped())?;
        if saved.metadata.representation.is_none() {
            saved.metadata.representation = Some(saved.representation());
        }
        self.repository.save(&saved, path)?;
        Ok(saved)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
#[derive(Default)]
pub struct AppBuilder {
    repository: Option<Arc<dyn AgentRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository<R: AgentRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for all learners and courses.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app. Without a repository, uses `MsgPackRepository`.
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::InMemoryRepository, ports::Environment};

    #[test]
    fn test_app_creates_every_kind() {
        let app = App::new();
        for kind in AgentKind::ALL {
            let learner = app.create_learner(&AgentConfig::new(kind)).unwrap();
            let saved = SavedAgent::from_learner(learner.as_ref(), TrainingMetadata::default())
                .unwrap();
            assert_eq!(saved.kind, kind);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let app = App::new();
        let config = AgentConfig::default().with_discount_factor(2.0);
        assert!(app.create_learner(&config).is_err());
    }

    #[test]
    fn test_default_seed_gives_identical_courses() {
        let app = App::for_testing().with_default_seed(42).build();
        let a = app
            .create_course(CourseConfig::default(), RewardValues::default(), None)
            .unwrap();
        let b = app
            .create_course(CourseConfig::default(), RewardValues::default(), None)
            .unwrap();
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn test_save_and_load_through_repository() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing().with_repository(repo.clone()).build();
        let learner = app
            .create_learner(&AgentConfig::new(AgentKind::MonteCarlo))
            .unwrap();

        let metadata = TrainingMetadata {
            episodes_trained: 10,
            ..TrainingMetadata::default()
        };
        let path = Path::new("mc");
        app.save_learner(learner.as_ref(), metadata, path).unwrap();
        assert!(repo.contains(path));

        let loaded = app.load_agent(path).unwrap();
        assert_eq!(loaded.kind, AgentKind::MonteCarlo);
        assert_eq!(loaded.metadata.episodes_trained, 10);
        assert!(loaded.metadata.saved_at.is_some());
        assert_eq!(loaded.metadata.representation.as_deref(), Some("bird-grid"));
    }
}

//! Training pipeline for learnable agents

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Error, Result,
    ports::{Environment, EpisodeSummary, Learner, Observer},
    types::Transition,
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of episodes to play
    pub episodes: usize,

    /// Random seed for the learner
    pub seed: Option<u64>,

    /// Log a progress line every this many episodes (0 disables)
    pub log_every: usize,

    /// Cut episodes off after this many frames
    pub max_steps_per_episode: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            seed: None,
            log_every: 100,
            max_steps_per_episode: None,
        }
    }
}

/// Result of a training or evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Episodes played
    pub episodes: usize,

    /// Pipes passed per episode
    pub scores: Vec<f64>,

    /// Sum of rewards per episode
    pub returns: Vec<f64>,

    /// Best single-episode score
    pub best_score: f64,

    /// Mean score over all episodes
    pub mean_score: f64,

    /// Episodes stopped by the step cap
    pub truncated: usize,
}

impl TrainingResult {
    fn push(&mut self, summary: &EpisodeSummary) {
        let score = f64::from(summary.pipes);
        self.episodes += 1;
        self.scores.push(score);
        self.returns.push(summary.total_reward);
        self.best_score = self.best_score.max(score);
        self.mean_score += (score - self.mean_score) / self.episodes as f64;
        if summary.truncated {
            self.truncated += 1;
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| Error::Io {
            operation: format!("create result file {path:?}"),
            source,
        })?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            operation: format!("open result file {path:?}"),
            source,
        })?;
        Ok(serde_json::from_reader(file)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Train,
    Evaluate,
}

/// Frame loop driving a learner through episodes of an environment
///
/// The environment decides the rewards. Build it with
/// [`Learner::reward_values`] for training and
/// [`RewardValues::evaluation`](crate::types::RewardValues::evaluation) for
/// evaluation.
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `learner` for the configured number of episodes.
    pub fn train(
        &mut self,
        learner: &mut dyn Learner,
        env: &mut dyn Environment,
    ) -> Result<TrainingResult> {
        self.run(learner, env, Mode::Train)
    }

    /// Play greedily without learning.
    pub fn evaluate(
        &mut self,
        learner: &mut dyn Learner,
        env: &mut dyn Environment,
    ) -> Result<TrainingResult> {
        self.run(learner, env, Mode::Evaluate)
    }

    fn run(
        &mut self,
        learner: &mut dyn Learner,
        env: &mut dyn Environment,
        mode: Mode,
    ) -> Result<TrainingResult> {
        if let Some(seed) = self.config.seed {
            learner.set_rng_seed(seed)?;
        }

        info!(
            learner = learner.name(),
            episodes = self.config.episodes,
            ?mode,
            "starting run"
        );

        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        let mut result = TrainingResult::default();
        for episode in 0..self.config.episodes {
            let summary = self.play_episode(episode, learner, env, mode)?;
            result.push(&summary);

            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }

            let log_every = self.config.log_every;
            if log_every > 0 && (episode + 1) % log_every == 0 {
                let recent = &result.scores[result.scores.len() - log_every..];
                let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;
                info!(
                    episode = episode + 1,
                    recent_mean,
                    best = result.best_score,
                    epsilon = learner.epsilon(),
                    "progress"
                );
            }
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        info!(
            episodes = result.episodes,
            mean = result.mean_score,
            best = result.best_score,
            truncated = result.truncated,
            "run finished"
        );
        Ok(result)
    }

    fn play_episode(
        &mut self,
        episode: usize,
        learner: &mut dyn Learner,
        env: &mut dyn Environment,
        mode: Mode,
    ) -> Result<EpisodeSummary> {
        env.reset()?;
        for observer in &mut self.observers {
            observer.on_episode_start(episode)?;
        }

        let mut state = env.state();
        let mut total_reward = 0.0;
        let mut steps = 0;
        let truncated = loop {
            let action = match mode {
                Mode::Train => learner.training_action(&state),
                Mode::Evaluate => learner.greedy_action(&state),
            };
            let reward = env.act(action);
            let next_state = env.state();
            steps += 1;
            total_reward += reward;

            let game_over = env.is_game_over();
            let capped = !game_over
                && self
                    .config
                    .max_steps_per_episode
                    .is_some_and(|max| steps >= max);

            if mode == Mode::Train {
                learner.observe(&Transition {
                    state,
                    action,
                    reward,
                    next_state,
                    terminal: game_over || capped,
                })?;
            }

            for observer in &mut self.observers {
                observer.on_step(episode, steps - 1, &state, action, reward)?;
            }

            state = next_state;
            if game_over || capped {
                break capped;
            }
        };

        if mode == Mode::Train {
            learner.end_episode()?;
        }

        if truncated {
            debug!(episode, steps, "episode truncated at step cap");
        }

        Ok(EpisodeSummary {
            episode,
            total_reward,
            pipes: env.score(),
            steps,
            truncated,
        })
    }
}

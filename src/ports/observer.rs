//! Observer port - abstraction for training observation and data collection
//!
//! This port lets progress bars, metrics and JSONL exports watch a training
//! run without the pipeline knowing about any of them.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    types::{Action, GameState},
};

/// Outcome of one finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Episode index (0-based)
    pub episode: usize,
    /// Sum of rewards received (training or evaluation rewards)
    pub total_reward: f64,
    /// Pipes passed
    pub pipes: u32,
    /// Frames played
    pub steps: usize,
    /// Episode stopped by the step cap rather than a crash
    pub truncated: bool,
}

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - once
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(...)` - once per frame
///    - `on_episode_end(summary)`
/// 3. `on_training_end()` - once
///
/// # Examples
///
/// ```no_run
/// use flappy_rl::ports::{EpisodeSummary, Observer};
///
/// struct BestScore {
///     best: u32,
/// }
///
/// impl Observer for BestScore {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> flappy_rl::Result<()> {
///         self.best = self.best.max(summary.pipes);
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each frame, once the learner has observed the transition.
    fn on_step(
        &mut self,
        _episode: usize,
        _step: usize,
        _state: &GameState,
        _action: Action,
        _reward: f64,
    ) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called when the run completes. Use this to flush files or finish bars.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}

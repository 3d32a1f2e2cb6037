//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::{EpisodeSummary, Observer},
    types::{Action, GameState},
};

/// Observation of a single frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepObservation {
    pub step: usize,
    pub state: GameState,
    pub action: Action,
    pub reward: f64,
}

/// Complete observation of one episode, written as a JSONL record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    #[serde(flatten)]
    pub summary: EpisodeSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepObservation>,
}

/// Progress bar observer - Shows training progress
#[derive(Default)]
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    best: u32,
    last: u32,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn message(&self) -> String {
        format!("best {} last {}", self.best, self.last)
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.last = summary.pipes;
        self.best = self.best.max(summary.pipes);
        if let Some(pb) = &self.progress_bar {
            pb.set_position(summary.episode as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
///
/// Clones share the same totals. Keep one clone to read [`summary`] after the
/// pipeline has taken ownership of the other.
///
/// [`summary`]: MetricsObserver::summary
#[derive(Debug, Default, Clone)]
pub struct MetricsObserver {
    totals: Arc<Mutex<MetricsTotals>>,
}

#[derive(Debug, Default)]
struct MetricsTotals {
    episodes: usize,
    total_pipes: u64,
    best_pipes: u32,
    total_reward: f64,
    total_steps: usize,
    truncated: usize,
}

impl MetricsTotals {
    fn per_episode(&self, total: f64) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            total / self.episodes as f64
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub best_pipes: u32,
    pub mean_pipes: f64,
    pub mean_reward: f64,
    pub mean_steps: f64,
    pub truncated: usize,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn totals(&self) -> MutexGuard<'_, MetricsTotals> {
        self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn summary(&self) -> MetricsSummary {
        let totals = self.totals();
        MetricsSummary {
            episodes: totals.episodes,
            best_pipes: totals.best_pipes,
            mean_pipes: totals.per_episode(totals.total_pipes as f64),
            mean_reward: totals.per_episode(totals.total_reward),
            mean_steps: totals.per_episode(totals.total_steps as f64),
            truncated: totals.truncated,
        }
    }
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let mut totals = self.totals();
        totals.episodes += 1;
        totals.total_pipes += u64::from(summary.pipes);
        totals.best_pipes = totals.best_pipes.max(summary.pipes);
        totals.total_reward += summary.total_reward;
        totals.total_steps += summary.steps;
        if summary.truncated {
            totals.truncated += 1;
        }
        Ok(())
    }
}

/// JSONL observer - Exports one record per episode to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    record_steps: bool,
    current_steps: Vec<StepObservation>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| crate::Error::Io {
            operation: format!("create observations file {path:?}"),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
            record_steps: false,
            current_steps: Vec::new(),
        })
    }

    /// Also record every frame of every episode.
    pub fn with_steps(mut self, record_steps: bool) -> Self {
        self.record_steps = record_steps;
        self
    }
}

impl Observer for JsonlObserver {
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.current_steps.clear();
        Ok(())
    }

    fn on_step(
        &mut self,
        _episode: usize,
        step: usize,
        state: &GameState,
        action: Action,
        reward: f64,
    ) -> Result<()> {
        if self.record_steps {
            self.current_steps.push(StepObservation {
                step,
                state: *state,
                action,
                reward,
            });
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let observation = Observation {
            summary: *summary,
            steps: std::mem::take(&mut self.current_steps),
        };

        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

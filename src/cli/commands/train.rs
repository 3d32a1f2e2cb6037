//! Train command - Train a learner on the headless course

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;
use tracing::{info, warn};

use crate::{
    analysis::ScoreSummary,
    app::{AgentConfig, App, load_json},
    cli::output::{format_number, print_section, print_stats_table},
    discretize::EncoderKind,
    features::FeatureSet,
    game::CourseConfig,
    persistence::{AgentKind, TrainingMetadata},
    pipeline::{
        JsonlObserver, Learner, ProgressObserver, TrainingConfig, TrainingPipeline, TrainingResult,
    },
    q_learning::QInit,
    types::RewardValues,
};

/// Episodes averaged for the "recent" figure in summaries
pub(crate) const RECENT_EPISODES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LearnerType {
    /// Tabular Q-learning
    QLearning,
    /// Monte Carlo control with first-visit returns
    MonteCarlo,
    /// Q-learning with a linear value function
    Linear,
}

impl From<LearnerType> for AgentKind {
    fn from(value: LearnerType) -> Self {
        match value {
            LearnerType::QLearning => AgentKind::QLearning,
            LearnerType::MonteCarlo => AgentKind::MonteCarlo,
            LearnerType::Linear => AgentKind::Linear,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a learner", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Type of learner to train
    #[arg(value_enum)]
    pub learner: LearnerType,

    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 1000)]
    pub episodes: usize,

    /// Output file for the trained agent
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Continue training a previously saved agent
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// Optional file for JSONL observations (one record per episode)
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Include every frame in the JSONL observations
    #[arg(long)]
    pub record_steps: bool,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON agent configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON course configuration
    #[arg(long)]
    pub course: Option<PathBuf>,

    /// State encoder for tabular learners
    #[arg(long)]
    pub encoder: Option<EncoderKind>,

    /// Feature set for the linear learner
    #[arg(long)]
    pub features: Option<FeatureSet>,

    /// Learning rate α
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Discount factor γ
    #[arg(long)]
    pub discount: Option<f64>,

    /// Exploration rate ε
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Multiplicative ε decay applied after every episode
    #[arg(long)]
    pub epsilon_decay: Option<f64>,

    /// Lower bound for ε
    #[arg(long)]
    pub min_epsilon: Option<f64>,

    /// Constant initial value for unseen Q-table entries
    #[arg(long, conflicts_with = "q_init_range")]
    pub q_init: Option<f64>,

    /// Draw initial Q-values uniformly from the integers in [LOW, HIGH]
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"])]
    pub q_init_range: Option<Vec<i32>>,

    /// Reward for passing a pipe
    #[arg(long)]
    pub reward_positive: Option<f64>,

    /// Reward for every frame survived
    #[arg(long)]
    pub reward_tick: Option<f64>,

    /// Reward for crashing
    #[arg(long)]
    pub reward_loss: Option<f64>,

    /// Log a progress line every N episodes (0 disables)
    #[arg(long, default_value_t = 100)]
    pub log_every: usize,

    /// Truncate episodes after this many frames
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

impl TrainArgs {
    fn has_overrides(&self) -> bool {
        self.config.is_some()
            || self.encoder.is_some()
            || self.features.is_some()
            || self.learning_rate.is_some()
            || self.discount.is_some()
            || self.epsilon.is_some()
            || self.epsilon_decay.is_some()
            || self.min_epsilon.is_some()
            || self.q_init.is_some()
            || self.q_init_range.is_some()
            || self.reward_positive.is_some()
            || self.reward_tick.is_some()
            || self.reward_loss.is_some()
    }

    /// Agent config from `--config` (or the kind defaults) with flag overrides applied.
    fn agent_config(&self) -> Result<AgentConfig> {
        let kind = AgentKind::from(self.learner);
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_json_file(path)
                .with_context(|| format!("Failed to read agent config {}", path.display()))?,
            None => AgentConfig::new(kind),
        };
        if config.kind != kind {
            bail!(
                "Config file describes a {} agent but '{}' was requested",
                config.kind,
                kind
            );
        }

        if let Some(encoder) = self.encoder {
            config.encoder = encoder;
        }
        if let Some(features) = self.features {
            config.features = features;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(discount) = self.discount {
            config.discount_factor = discount;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
            config.min_epsilon = config.min_epsilon.min(epsilon);
        }
        if let Some(decay) = self.epsilon_decay {
            config.epsilon_decay = decay;
        }
        if let Some(min_epsilon) = self.min_epsilon {
            config.min_epsilon = min_epsilon;
        }
        if let Some(value) = self.q_init {
            config.q_init = QInit::Constant(value);
        }
        if let Some(range) = &self.q_init_range {
            if let [low, high] = range[..] {
                config.q_init = QInit::UniformInt { low, high };
            }
        }
        config.rewards = RewardValues::new(
            self.reward_positive.unwrap_or(config.rewards.positive),
            self.reward_tick.unwrap_or(config.rewards.tick),
            self.reward_loss.unwrap_or(config.rewards.loss),
        );
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    learner: String,
    kind: AgentKind,
    representation: String,
    seed: Option<u64>,
    run: RunStats,
    /// Totals across every run of a continued agent
    overall: Option<ScoreSummary>,
    episodes_trained: usize,
}

#[derive(Debug, Serialize)]
struct RunStats {
    episodes: usize,
    mean_score: f64,
    best_score: f64,
    recent_mean: Option<f64>,
    truncated: usize,
}

impl From<&TrainingResult> for RunStats {
    fn from(result: &TrainingResult) -> Self {
        Self {
            episodes: result.episodes,
            mean_score: result.mean_score,
            best_score: result.best_score,
            recent_mean: ScoreSummary::from_scores(&result.scores, RECENT_EPISODES)
                .ok()
                .map(|s| s.recent_mean),
            truncated: result.truncated,
        }
    }
}

pub(crate) fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no file name means a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

pub(crate) fn load_course(path: Option<&Path>) -> Result<CourseConfig> {
    match path {
        Some(path) => load_json(path)
            .with_context(|| format!("Failed to read course config {}", path.display())),
        None => Ok(CourseConfig::default()),
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let app = App::new();
    let kind = AgentKind::from(args.learner);

    let (mut learner, prior): (Box<dyn Learner>, TrainingMetadata) = match &args.load {
        Some(path) => {
            let saved = app
                .load_agent(path)
                .with_context(|| format!("Failed to load agent from {}", path.display()))?;
            saved
                .ensure_kind(kind)
                .with_context(|| format!("Cannot continue training {}", path.display()))?;
            if args.has_overrides() {
                warn!("hyperparameter flags are ignored when continuing a saved agent");
            }
            info!(
                path = %path.display(),
                episodes = saved.metadata.episodes_trained,
                "continuing saved agent"
            );
            (saved.to_learner()?, saved.metadata)
        }
        None => {
            let config = args.agent_config()?;
            (app.create_learner(&config)?, TrainingMetadata::default())
        }
    };

    let course_config = load_course(args.course.as_deref())?;
    let mut course = app.create_course(course_config, learner.reward_values(), args.seed)?;

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: args.episodes,
        seed: args.seed,
        log_every: args.log_every,
        max_steps_per_episode: args.max_steps,
    });
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create {}", path.display()))?
            .with_steps(args.record_steps);
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    let result = pipeline.train(learner.as_mut(), &mut course)?;

    let mut scores = prior.scores;
    scores.extend_from_slice(&result.scores);
    let metadata = TrainingMetadata {
        episodes_trained: prior.episodes_trained + result.episodes,
        seed: args.seed.or(prior.seed),
        saved_at: None,
        representation: prior.representation,
        scores,
    };

    print_section(&format!("Training Results - {}", learner.name()));
    let run = RunStats::from(&result);
    print_stats_table(&[
        ("Episodes", format_number(run.episodes)),
        ("Mean pipes", format!("{:.2}", run.mean_score)),
        ("Best pipes", format!("{:.0}", run.best_score)),
        (
            "Recent mean",
            run.recent_mean
                .map_or_else(|| "-".to_string(), |m| format!("{m:.2}")),
        ),
        ("Truncated", format_number(run.truncated)),
        ("Total trained", format_number(metadata.episodes_trained)),
    ]);

    let representation = match &args.output {
        Some(path) => {
            let saved = app
                .save_learner(learner.as_ref(), metadata.clone(), path)
                .with_context(|| format!("Failed to save agent to {}", path.display()))?;
            println!("\n✓ Saved agent to {}", path.display());
            saved.metadata.representation.unwrap_or_default()
        }
        None => metadata.representation.clone().unwrap_or_default(),
    };

    if let Some(raw) = &args.summary {
        let path = sanitize_summary_path(raw);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let summary = TrainingSummaryFile {
            learner: learner.name().to_string(),
            kind,
            representation,
            seed: args.seed,
            run,
            overall: ScoreSummary::from_scores(&metadata.scores, RECENT_EPISODES).ok(),
            episodes_trained: metadata.episodes_trained,
        };
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        to_writer_pretty(file, &summary)?;
        println!("✓ Wrote summary to {}", path.display());
    }

    Ok(())
}

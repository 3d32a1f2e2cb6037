//! Evaluate command - Greedy play of a trained agent

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use super::train::{RECENT_EPISODES, load_course};
use crate::{
    analysis::ScoreSummary,
    app::App,
    cli::output::{format_number, print_kv, print_section, print_stats_table},
    pipeline::{
        MetricsObserver, MetricsSummary, ProgressObserver, TrainingConfig, TrainingPipeline,
    },
    types::RewardValues,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a trained learner")]
pub struct EvaluateArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 100)]
    pub episodes: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON course configuration
    #[arg(long)]
    pub course: Option<PathBuf>,

    /// Stop an episode after this many frames
    #[arg(long, default_value_t = 10_000)]
    pub max_steps: usize,

    /// Export results to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    agent: String,
    kind: String,
    episodes_trained: usize,
    summary: ScoreSummary,
    metrics: MetricsSummary,
    truncated: usize,
    scores: Vec<f64>,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let app = App::new();

    println!("Loading trained agent from: {}", args.agent.display());
    let saved = app
        .load_agent(&args.agent)
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;

    print_section("Loaded Agent Info");
    print_kv("Kind", saved.kind.as_str());
    if let Some(representation) = &saved.metadata.representation {
        print_kv("Representation", representation);
    }
    print_kv(
        "Episodes trained",
        &format_number(saved.metadata.episodes_trained),
    );
    if let Some(seed) = saved.metadata.seed {
        print_kv("Training seed", &seed.to_string());
    }

    let mut learner = saved.to_learner()?;
    let course_config = load_course(args.course.as_deref())?;
    let mut course = app.create_course(course_config, RewardValues::evaluation(), args.seed)?;

    let metrics = MetricsObserver::new();
    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: args.episodes,
        seed: args.seed,
        log_every: 0,
        max_steps_per_episode: Some(args.max_steps),
    })
    .with_observer(Box::new(metrics.clone()));
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }

    let result = pipeline.evaluate(learner.as_mut(), &mut course)?;
    let summary = ScoreSummary::from_scores(&result.scores, RECENT_EPISODES)?;
    let metrics = metrics.summary();

    print_section("Evaluation Results");
    print_stats_table(&[
        ("Episodes", format_number(summary.episodes)),
        ("Mean pipes", format!("{:.2}", summary.mean)),
        ("Best pipes", format!("{:.0}", summary.best)),
        ("Mean frames", format!("{:.1}", metrics.mean_steps)),
        ("Mean reward", format!("{:.2}", metrics.mean_reward)),
        ("Truncated", format_number(result.truncated)),
    ]);

    if let Some(path) = &args.export {
        let report = EvaluationReport {
            agent: args.agent.display().to_string(),
            kind: saved.kind.to_string(),
            episodes_trained: saved.metadata.episodes_trained,
            summary,
            metrics,
            truncated: result.truncated,
            scores: result.scores,
        };
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)?;
        println!("\n✓ Exported results to {}", path.display());
    }

    Ok(())
}

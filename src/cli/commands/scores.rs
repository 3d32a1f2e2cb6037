//! Scores command - Summarize the training score history of a saved agent

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    analysis::{ScoreSummary, block_averages},
    app::App,
    cli::output::{format_number, print_section, print_stats_table, print_subsection},
    export::write_block_averages,
};

#[derive(Parser, Debug)]
#[command(about = "Average the training scores of a saved agent in blocks")]
pub struct ScoresArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Number of equal blocks to average over
    #[arg(long, short = 'b', default_value_t = 10)]
    pub blocks: usize,

    /// Episodes averaged for the recent mean
    #[arg(long, default_value_t = 100)]
    pub recent: usize,

    /// Write the block averages to a CSV file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn execute(args: ScoresArgs) -> Result<()> {
    let saved = App::new()
        .load_agent(&args.agent)
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;
    let scores = &saved.metadata.scores;

    let summary = ScoreSummary::from_scores(scores, args.recent)
        .context("The agent file has no recorded training scores")?;
    let blocks = block_averages(scores, args.blocks.min(scores.len()))?;

    print_section(&format!("Score History - {}", saved.kind));
    print_stats_table(&[
        ("Episodes", format_number(summary.episodes)),
        ("Mean pipes", format!("{:.2}", summary.mean)),
        ("Best pipes", format!("{:.0}", summary.best)),
        (
            "Recent mean",
            format!("{:.2} (last {})", summary.recent_mean, summary.recent),
        ),
    ]);

    print_subsection("Block averages");
    for block in &blocks {
        println!("  {:>10}  {:.3}", format_number(block.episodes), block.mean);
    }

    if let Some(path) = &args.output {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_block_averages(file, &blocks)?;
        println!("\n✓ Wrote {} block(s) to {}", blocks.len(), path.display());
    }

    Ok(())
}

//! Export command - Dump learned values as CSV
//!
//! Tabular agents produce one row per discretized state with both action
//! values, the state value and the greedy policy. Linear agents produce one
//! row per feature with both weights.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{app::App, export::export_agent};

#[derive(Parser, Debug)]
#[command(about = "Export learned values to CSV")]
pub struct ExportArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Output CSV path
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let saved = App::new()
        .load_agent(&args.agent)
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;

    let summary = export_agent(&saved, &args.output)
        .with_context(|| format!("Failed to export to {}", args.output.display()))?;

    println!(
        "✓ Exported {} row(s) of the {} agent to {}",
        summary.rows,
        summary.kind,
        args.output.display()
    );
    Ok(())
}

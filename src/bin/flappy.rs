//! Flappy RL CLI - Train and inspect reinforcement learning agents for a
//! side-scrolling flapping game
//!
//! Subcommands:
//! - Training Q-learning, Monte Carlo and linear function approximation agents
//! - Evaluating saved agents with greedy play
//! - Exporting learned values for plotting
//! - Summarizing training score histories

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flappy")]
#[command(version, about = "Reinforcement learning agents for a flapping game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a learner (Q-learning, Monte Carlo, linear)
    Train(Box<flappy_rl::cli::commands::train::TrainArgs>),

    /// Evaluate a trained learner with greedy play
    Evaluate(flappy_rl::cli::commands::evaluate::EvaluateArgs),

    /// Export learned values to CSV
    Export(flappy_rl::cli::commands::export::ExportArgs),

    /// Summarize the training scores of a saved agent
    Scores(flappy_rl::cli::commands::scores::ScoresArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => flappy_rl::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => flappy_rl::cli::commands::evaluate::execute(args),
        Commands::Export(args) => flappy_rl::cli::commands::export::execute(args),
        Commands::Scores(args) => flappy_rl::cli::commands::scores::execute(args),
    }
}

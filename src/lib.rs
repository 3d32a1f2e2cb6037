//! Reinforcement learning agents for a side-scrolling flapping game
//!
//! This crate provides:
//! - State encoders and feature sets over raw game observations
//! - Tabular Q-learning and first-visit Monte Carlo control agents
//! - Linear Q-learning with semi-gradient updates
//! - A headless course simulator behind the `Environment` port
//! - Training and evaluation pipelines with pluggable observers
//! - Agent persistence, score statistics and CSV export

pub mod adapters;
pub mod analysis;
pub mod app;
pub mod cli;
pub mod discretize;
pub mod error;
pub mod exploration;
pub mod export;
pub mod features;
pub mod game;
pub mod linear;
pub mod monte_carlo;
pub mod persistence;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod types;

pub use discretize::EncoderKind;
pub use error::{Error, Result};
pub use exploration::EpsilonSchedule;
pub use features::FeatureSet;
pub use game::{CourseConfig, FlappyCourse};
pub use linear::LinearAgent;
pub use monte_carlo::MonteCarloAgent;
pub use persistence::{AgentKind, SavedAgent, TrainingMetadata};
pub use q_learning::{QInit, QLearningAgent};
pub use types::{Action, DiscreteState, GameState, RewardValues, Transition};

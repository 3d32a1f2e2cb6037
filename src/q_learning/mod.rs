//! Tabular Q-learning
//!
//! Off-policy temporal difference control over a discretized state space:
//!
//! Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
//!
//! ## Usage Example
//!
//! ```no_run
//! use flappy_rl::{
//!     discretize::EncoderKind,
//!     exploration::EpsilonSchedule,
//!     q_learning::{QInit, QLearningAgent},
//! };
//!
//! let agent = QLearningAgent::new(
//!     0.1,                            // learning_rate
//!     1.0,                            // discount_factor
//!     EpsilonSchedule::constant(0.1), // exploration
//!     QInit::Constant(0.0),           // initial Q-value
//! )
//! .with_encoder(EncoderKind::GapOffset)
//! .with_seed(42);
//! ```

pub mod agent;
pub mod q_table;

pub use agent::QLearningAgent;
pub(crate) use agent::TabularAgentState;
pub use q_table::{QInit, QTable, bellman_update};

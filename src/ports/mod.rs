//! Ports (trait boundaries) for external dependencies.
//!
//! These traits are owned by the domain and implemented by agents, the game
//! simulator and the storage adapters.

pub mod environment;
pub mod learner;
pub mod observer;
pub mod repository;

pub use environment::Environment;
pub use learner::Learner;
pub use observer::{EpisodeSummary, Observer};
pub use repository::AgentRepository;

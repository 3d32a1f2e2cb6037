//! Application layer with dependency injection container.
//!
//! The container owns infrastructure dependencies (the agent repository and a
//! default seed) and builds learners and courses from configuration.
//!
//! ```text
//!  AgentConfig ──► App::create_learner ──► Box<dyn Learner>
//!                                              │
//!  CourseConfig ─► App::create_course ──► FlappyCourse (Environment)
//!                                              │
//!                         TrainingPipeline ◄───┘
//!                                              │
//!  App::save_learner ──► AgentRepository (MsgPack / in-memory)
//! ```

pub mod config;
pub mod container;

pub use config::{AgentConfig, load_json};
pub use container::{App, AppBuilder};

//! CLI infrastructure for training, evaluating and inspecting agents

pub mod commands;
pub mod output;

//! Subcommands of the `flappy` binary

pub mod evaluate;
pub mod export;
pub mod scores;
pub mod train;

//! Analysis tools for studying trained agents
//!
//! Numeric summaries of score histories and row dumps of learned values,
//! ready for plotting with an external tool.

pub mod scores;
pub mod values;

pub use scores::{BlockAverage, ScoreSummary, block_averages};
pub use values::{ValueRow, WeightRow, average_rows, table_rows, weight_rows};

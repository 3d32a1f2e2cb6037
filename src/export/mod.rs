//! Export functionality for analysis and research
//!
//! CSV dumps of learned values, linear weights and score block averages.

mod values_csv;

pub use values_csv::{
    ExportSummary, export_agent, write_block_averages, write_value_rows, write_weight_rows,
};

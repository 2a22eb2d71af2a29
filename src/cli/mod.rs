//! Command-line interface.

mod commands;
mod output;

pub use commands::{is_verbose, run};
pub use output::OutputFormat;

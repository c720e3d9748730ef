//! Solventa CLI - batch runner for the proposal-extraction pipeline.

#![warn(missing_docs)]

mod cli;
mod config;
mod error;
mod output;
mod pipeline;

pub use cli::Cli;
pub use config::{AppConfig, LlmSettings};
pub use error::{CliError, Result};
pub use output::summary_table;
pub use pipeline::{discover_inputs, Pipeline, PipelineJudge, ProcessingSummary};

//! CLI argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Solventa - batch extraction of remediation proposals from audit
/// documents.
#[derive(Debug, Parser)]
#[command(name = "solventa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding parsed-document handles (*.docx.json / *.xlsx.json)
    #[arg(short, long, default_value = "ejemplos")]
    pub input: PathBuf,

    /// Directory for consolidated outputs
    #[arg(short, long, default_value = "resultados_consolidados")]
    pub output: PathBuf,

    /// SQLite database path
    #[arg(long, default_value = "propuestas.db")]
    pub db: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep previously stored proposals instead of starting fresh
    #[arg(long)]
    pub keep_data: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

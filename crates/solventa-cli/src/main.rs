//! Solventa - extracts remediation proposals from parsed audit
//! documents into a deduplicated consolidated database.

use clap::Parser;
use solventa_cli::{summary_table, AppConfig, Cli, Pipeline};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.validate()?;

    let mut pipeline = Pipeline::new(&cli.db, &config, cli.keep_data)?;
    let summary = pipeline.run(&cli.input, &cli.output).await?;

    println!("{}", summary_table(&summary));
    println!("Resultados en: {}", cli.output.display());
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

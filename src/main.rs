use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use ncrp::cli::{Cli, Commands};
use ncrp::configs::{BuildGraphConfig, RunConfig};
use ncrp::{label_pipeline, utils};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let start = Instant::now();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => {
            let config = RunConfig::try_from(args)?;
            let summary = label_pipeline::run(&config)?;
            info!(
                "Labels | initial: {}  |  after refine: {}  |  final: {}  |  reads: {}",
                summary.initial_labels, summary.refined_labels, summary.final_labels, summary.total_reads
            );
        }
        Commands::BuildGraph(args) => {
            let config = BuildGraphConfig::try_from(args)?;
            label_pipeline::build_graph(&config)?;
        }
    }

    utils::report_resources(start);
    Ok(())
}

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use psc_convert::{convert_network_to_study, ConvertOptions, SeriesFormat};
use psc_core::Network;

/// Convert a power-system network model into an optimization study.
#[derive(Parser, Debug)]
#[command(name = "psc", version, about)]
struct Cli {
    /// Path to the source network (JSON)
    network: PathBuf,

    /// Output directory for the study tree
    #[arg(short, long, default_value = "study")]
    output: PathBuf,

    /// Series file format: csv or tsv
    #[arg(short, long, default_value = "csv")]
    format: String,

    /// Override the system identifier (defaults to the network name)
    #[arg(long)]
    system_name: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("installing tracing subscriber")?;

    // Reject a bad format flag before touching the network or filesystem.
    let format = SeriesFormat::parse(&cli.format)?;

    let raw = fs::read_to_string(&cli.network)
        .with_context(|| format!("reading {}", cli.network.display()))?;
    let network: Network = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", cli.network.display()))?;
    info!("loaded network '{}': {}", network.name, network.stats());

    let options = ConvertOptions {
        format,
        system_name: cli.system_name,
        ..ConvertOptions::default()
    };
    match convert_network_to_study(&network, &cli.output, options) {
        Ok(summary) => {
            info!(
                "study '{}' written to {} ({} components, {} connections, {} series files)",
                summary.system_name,
                summary.input_dir.display(),
                summary.num_components,
                summary.num_connections,
                summary.num_series_files,
            );
            Ok(())
        }
        Err(err) => {
            error!("conversion failed: {err}");
            Err(err.into())
        }
    }
}

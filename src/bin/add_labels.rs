//! Attach look-ahead direction labels to the feature table
//!
//! Usage: cargo run --bin add_labels -- --input data/processed/btc_1m_features.csv

use anyhow::Result;
use btc_direction_ml::{add_labels_file, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Add target_1m / target_5m labels to a feature table")]
struct Args {
    /// Feature CSV (defaults to paths.features)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output labeled CSV (defaults to paths.labeled)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("btc_direction_ml=info")
        .init();

    let args = Args::parse();
    let config = PipelineConfig::load_or_default(args.config.as_ref())?;

    let input = args.input.unwrap_or(config.paths.features);
    let output = args.output.unwrap_or(config.paths.labeled);

    let labeled = add_labels_file(&input, &output, &config.labels)?;

    println!("Saved {} labeled rows to {}", labeled.len(), output.display());
    Ok(())
}

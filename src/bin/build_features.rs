//! Build the feature table from raw 1-minute candles
//!
//! Usage: cargo run --bin build_features -- --input data/raw/btc_1m.csv

use anyhow::Result;
use btc_direction_ml::{build_features_file, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compute technical indicators for BTC 1m candles")]
struct Args {
    /// Raw OHLCV CSV (defaults to paths.raw)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output feature CSV (defaults to paths.features)
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

    let input = args.input.unwrap_or(config.paths.raw);
    let output = args.output.unwrap_or(config.paths.features);

    let features = build_features_file(&input, &output, &config.features)?;
    info!("Feature columns: {}", features.column_names().join(", "));

    println!("Saved features to {}", output.display());
    Ok(())
}

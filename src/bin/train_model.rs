//! Train and evaluate the direction classifier on the labeled table
//!
//! Usage: cargo run --bin train_model -- --target target_5m

use anyhow::Result;
use btc_direction_ml::{train_file, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a gradient boosting classifier on BTC 1m labels")]
struct Args {
    /// Labeled CSV (defaults to paths.labeled)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Label column to predict (defaults to training.target)
    #[arg(short, long)]
    target: Option<String>,

    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("btc_direction_ml=info")
        .init();

    let args = Args::parse();
    let mut config = PipelineConfig::load_or_default(args.config.as_ref())?;

    let input = args.input.unwrap_or(config.paths.labeled);
    if let Some(target) = args.target {
        config.training.target = target;
    }

    println!("===========================================");
    println!("  BTC 1m Direction Classifier");
    println!("===========================================\n");

    let report = train_file(&input, &config.training, &config.labels)?;
    println!("{}", report);

    Ok(())
}

//! BTC 1-minute direction classification
//!
//! An offline, three-stage batch pipeline over 1-minute BTC OHLCV candles:
//! technical indicators, look-ahead direction labels, and a gradient
//! boosting classifier evaluated on a chronological hold-out.
//!
//! # Modules
//!
//! - [`data`] - Timestamp-indexed tables, CSV I/O and learner datasets
//! - [`features`] - Technical indicators and the feature builder
//! - [`labels`] - Binary price-direction labels
//! - [`models`] - Classifier capability, gradient boosting and metrics
//! - [`training`] - Chronological split, fit and evaluation report
//! - [`pipeline`] - File-level stage entry points
//! - [`config`] - TOML configuration shared by the stage binaries
//!
//! # Example
//!
//! ```rust,no_run
//! use btc_direction_ml::data::load_frame;
//! use btc_direction_ml::features::FeatureBuilder;
//! use btc_direction_ml::labels::Labeler;
//! use btc_direction_ml::training::{Trainer, TrainingConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     // 1. Load raw candles
//!     let raw = load_frame("data/raw/btc_1m.csv", &["open", "high", "low", "close", "volume"])?;
//!
//!     // 2. Engineer features
//!     let features = FeatureBuilder::new().build(&raw)?;
//!
//!     // 3. Attach labels
//!     let labeler = Labeler::new();
//!     let labeled = labeler.label(&features)?;
//!
//!     // 4. Train and evaluate
//!     let trainer = Trainer::gbm(TrainingConfig::default(), labeler.config().label_columns());
//!     let report = trainer.evaluate(&labeled)?;
//!     println!("{}", report);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod labels;
pub mod models;
pub mod pipeline;
pub mod training;

// Re-export commonly used items at the crate level
pub use config::{PathsConfig, PipelineConfig};
pub use data::{load_frame, save_frame, Candle, Dataset, Frame};
pub use error::{PipelineError, Result};
pub use features::{FeatureBuilder, FeatureConfig};
pub use labels::{LabelConfig, Labeler};
pub use models::{Classifier, GbmClassifier, GbmParams, ModelError};
pub use pipeline::{add_labels_file, build_features_file, train_file};
pub use training::{EvaluationReport, Trainer, TrainingConfig};

//! File-level stage entry points
//!
//! Each stage loads its input table, runs the pure transform and only then
//! writes its output, so a failing stage leaves no output behind.

use crate::data::{load_frame, save_frame, Frame, CLOSE_COLUMN, OHLCV_COLUMNS};
use crate::error::Result;
use crate::features::{FeatureBuilder, FeatureConfig};
use crate::labels::{LabelConfig, Labeler};
use crate::training::{EvaluationReport, Trainer, TrainingConfig};
use std::path::Path;
use tracing::info;

/// Raw OHLCV CSV to feature CSV
pub fn build_features_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &FeatureConfig,
) -> Result<Frame> {
    info!("Building features from {:?}", input.as_ref());
    let raw = load_frame(input, &OHLCV_COLUMNS)?;
    let features = FeatureBuilder::with_config(config.clone()).build(&raw)?;
    save_frame(&features, output)?;
    Ok(features)
}

/// Feature CSV to labeled CSV
pub fn add_labels_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &LabelConfig,
) -> Result<Frame> {
    info!("Adding labels to {:?}", input.as_ref());
    let features = load_frame(input, &[CLOSE_COLUMN])?;
    let labeled = Labeler::with_config(config.clone()).label(&features)?;
    save_frame(&labeled, output)?;
    Ok(labeled)
}

/// Labeled CSV to evaluation report
///
/// `labels` names the label columns present in the file so that none of
/// them leak into the feature matrix.
pub fn train_file<P: AsRef<Path>>(
    input: P,
    training: &TrainingConfig,
    labels: &LabelConfig,
) -> Result<EvaluationReport> {
    info!("Training on {:?}", input.as_ref());
    let labeled = load_frame(input, &[])?;
    Trainer::gbm(training.clone(), labels.label_columns()).evaluate(&labeled)
}

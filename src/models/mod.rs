//! Machine learning models module
//!
//! This module provides:
//! - The [`Classifier`] capability the trainer is written against
//! - A gradient boosted tree classifier on the log-loss
//! - Classification metrics

pub mod classifier;
pub mod gbm;
pub mod metrics;
pub mod tree;

pub use classifier::Classifier;
pub use gbm::{GbmClassifier, GbmModel, GbmParams, ModelError};
pub use metrics::{log_loss, ClassificationReport, ConfusionMatrix};
pub use tree::{GradientTree, TreeConfig, TreeNode};

//! Model training and evaluation
//!
//! Splits a labeled table chronologically, fits a [`Classifier`] on the
//! earlier rows and scores it on the later ones.
//!
//! [`Classifier`]: crate::models::Classifier

pub mod trainer;

pub use trainer::{EvaluationReport, Trainer, TrainingConfig};

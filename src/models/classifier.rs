//! Supervised learner capability
//!
//! The trainer only talks to this trait, so any binary classifier can be
//! dropped in without touching the pipeline.

use super::ModelError;
use ndarray::ArrayView2;

/// A binary classifier that produces a separate fitted model
pub trait Classifier {
    /// Fitted model produced by [`Classifier::fit`]
    type Model;

    /// Fit a model on a feature matrix (rows = samples) and 0/1 labels
    fn fit(&self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<Self::Model, ModelError>;

    /// Predict a 0/1 label for every row
    fn predict(&self, model: &Self::Model, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, ModelError>;

    /// Probability of the positive class for every row, if the learner has one
    fn predict_proba(
        &self,
        _model: &Self::Model,
        _features: ArrayView2<'_, f64>,
    ) -> Result<Option<Vec<f64>>, ModelError> {
        Ok(None)
    }

    /// Normalized per-feature importances, if the learner tracks them
    fn feature_importances(&self, _model: &Self::Model) -> Option<Vec<f64>> {
        None
    }
}

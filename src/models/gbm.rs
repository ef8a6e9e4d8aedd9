//! Gradient Boosting Machine classifier
//!
//! Boosted regression trees on the binary log-loss. Each round fits a
//! [`GradientTree`] to the gradient `p - y` and hessian `p (1 - p)` of the
//! current predictions and adds its output, shrunk by the learning rate, to
//! the raw log-odds score.

use super::classifier::Classifier;
use super::metrics::log_loss;
use super::tree::{GradientTree, TreeConfig};
use ndarray::{ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur with the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Probability clip used for the initial score
const BASE_RATE_CLIP: f64 = 1e-6;
/// Hessian floor so pure leaves keep a finite weight
const MIN_HESSIAN: f64 = 1e-16;

/// GBM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// L2 regularization on leaf weights
    pub lambda: f64,
    /// Minimum hessian sum required in each child
    pub min_child_weight: f64,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
    /// Subsample ratio of the training instances per tree
    pub subsample: f64,
    /// Random seed for row subsampling
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.3,
            lambda: 1.0,
            min_child_weight: 1.0,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl GbmParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.learning_rate > 0.0) {
            return Err(ModelError::TrainingFailed(
                "learning_rate must be positive".to_string(),
            ));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ModelError::TrainingFailed(
                "subsample must be in (0, 1]".to_string(),
            ));
        }
        if !(self.lambda >= 0.0) || !(self.min_child_weight >= 0.0) {
            return Err(ModelError::TrainingFailed(
                "lambda and min_child_weight must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            min_child_weight: self.min_child_weight,
            lambda: self.lambda,
        }
    }
}

/// A fitted boosted ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmModel {
    base_score: f64,
    learning_rate: f64,
    trees: Vec<GradientTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
    train_loss: Vec<f64>,
}

impl GbmModel {
    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[GradientTree] {
        &self.trees
    }

    /// Initial log-odds shared by every prediction
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Training log-loss after each round
    pub fn train_loss(&self) -> &[f64] {
        &self.train_loss
    }

    /// Gain-based importances, normalized to sum to 1 (all zero if no tree split)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn raw_score(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| self.learning_rate * tree.predict_row(row))
                .sum::<f64>()
    }

    fn check_width(&self, features: &ArrayView2<'_, f64>) -> Result<(), ModelError> {
        if features.ncols() != self.n_features {
            return Err(ModelError::PredictionFailed(format!(
                "model was trained on {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }
        Ok(())
    }

    /// Probability of the positive class for every row
    pub fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
        self.check_width(&features)?;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| sigmoid(self.raw_score(row)))
            .collect())
    }

    /// Class labels with a 0.5 probability threshold
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, ModelError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}

/// Gradient Boosting Classifier for direction prediction
#[derive(Debug, Clone, Default)]
pub struct GbmClassifier {
    params: GbmParams,
}

impl GbmClassifier {
    /// Create a new GBM classifier with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new GBM classifier with custom parameters
    pub fn with_params(params: GbmParams) -> Self {
        Self { params }
    }

    /// Get model parameters
    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    fn check_training_data(features: &ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), ModelError> {
        if features.nrows() == 0 {
            return Err(ModelError::InvalidData("Empty dataset".to_string()));
        }
        if features.ncols() == 0 {
            return Err(ModelError::InvalidData("No features".to_string()));
        }
        if features.nrows() != labels.len() {
            return Err(ModelError::InvalidData(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&y| y > 1) {
            return Err(ModelError::InvalidData(format!(
                "labels must be 0 or 1, found {}",
                bad
            )));
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidData(
                "feature matrix contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    fn sample_rows(&self, n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..n).collect();
        if self.params.subsample < 1.0 {
            let size = ((n as f64 * self.params.subsample).ceil() as usize).clamp(1, n);
            rows.shuffle(rng);
            rows.truncate(size);
            rows.sort_unstable();
        }
        rows
    }
}

impl Classifier for GbmClassifier {
    type Model = GbmModel;

    /// Train the model on a feature matrix and binary labels
    fn fit(&self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<GbmModel, ModelError> {
        self.params.validate()?;
        Self::check_training_data(&features, labels)?;

        let n_samples = features.nrows();
        let n_features = features.ncols();
        let targets: Vec<f64> = labels.iter().map(|&y| f64::from(y)).collect();

        info!(
            "Training GBM classifier with {} samples and {} features",
            n_samples, n_features
        );
        debug!("Parameters: {:?}", self.params);

        let positive_rate = (targets.iter().sum::<f64>() / n_samples as f64)
            .clamp(BASE_RATE_CLIP, 1.0 - BASE_RATE_CLIP);
        let base_score = (positive_rate / (1.0 - positive_rate)).ln();

        let tree_config = self.params.tree_config();
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        let mut scores = vec![base_score; n_samples];
        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let mut train_loss = Vec::with_capacity(self.params.n_estimators);

        for round in 0..self.params.n_estimators {
            let probs: Vec<f64> = scores.iter().map(|&s| sigmoid(s)).collect();
            let grad: Vec<f64> = probs.iter().zip(&targets).map(|(p, y)| p - y).collect();
            let hess: Vec<f64> = probs
                .iter()
                .map(|p| (p * (1.0 - p)).max(MIN_HESSIAN))
                .collect();

            let rows = self.sample_rows(n_samples, &mut rng);
            let tree = GradientTree::fit(&tree_config, features, &grad, &hess, &rows, &mut importances);

            for (score, row) in scores.iter_mut().zip(features.rows()) {
                *score += self.params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);

            let probs: Vec<f64> = scores.iter().map(|&s| sigmoid(s)).collect();
            let loss = log_loss(labels, &probs);
            if !loss.is_finite() {
                return Err(ModelError::TrainingFailed(format!(
                    "log-loss diverged at round {}",
                    round + 1
                )));
            }
            debug!("Round {:>4}: train logloss = {:.6}", round + 1, loss);
            train_loss.push(loss);
        }

        let total_gain: f64 = importances.iter().sum();
        if total_gain > 0.0 {
            for imp in &mut importances {
                *imp /= total_gain;
            }
        }

        info!(
            "Classifier training completed: {} trees, final train logloss {:.6}",
            trees.len(),
            train_loss.last().copied().unwrap_or_else(|| {
                let base = vec![positive_rate; n_samples];
                log_loss(labels, &base)
            })
        );

        Ok(GbmModel {
            base_score,
            learning_rate: self.params.learning_rate,
            trees,
            n_features,
            feature_importances: importances,
            train_loss,
        })
    }

    fn predict(&self, model: &GbmModel, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, ModelError> {
        model.predict(features)
    }

    fn predict_proba(
        &self,
        model: &GbmModel,
        features: ArrayView2<'_, f64>,
    ) -> Result<Option<Vec<f64>>, ModelError> {
        model.predict_proba(features).map(Some)
    }

    fn feature_importances(&self, model: &GbmModel) -> Option<Vec<f64>> {
        Some(model.feature_importances().to_vec())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

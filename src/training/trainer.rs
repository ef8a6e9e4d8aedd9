//! Fit-then-evaluate on a chronological split

use crate::data::{Dataset, Frame};
use crate::error::{PipelineError, Result};
use crate::models::{
    log_loss, ClassificationReport, Classifier, ConfusionMatrix, GbmClassifier, GbmParams, ModelError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Label column to predict
    pub target: String,
    /// Share of rows (earliest first) used for training
    pub train_ratio: f64,
    /// How many feature importances to include in the report
    pub top_features: usize,
    /// Gradient boosting hyperparameters
    pub gbm: GbmParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target: "target_1m".to_string(),
            train_ratio: 0.8,
            top_features: 10,
            gbm: GbmParams::default(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(PipelineError::Config(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        Ok(())
    }

    /// Smallest table for which both sides of the split are non-empty
    ///
    /// With `train_ratio` in (0, 1) the test side is never empty, so this is
    /// the first `n` with `floor(n * train_ratio) >= 1`.
    fn min_rows(&self) -> usize {
        // start just below 1 / train_ratio to absorb rounding
        let mut n = ((1.0 / self.train_ratio).floor() as usize)
            .saturating_sub(1)
            .max(2);
        while n < usize::MAX && ((n as f64) * self.train_ratio).floor() < 1.0 {
            n += 1;
        }
        n
    }
}

/// Outcome of one fit-then-evaluate run
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub target: String,
    /// Columns the learner saw, in matrix order
    pub feature_names: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_period: (DateTime<Utc>, DateTime<Utc>),
    pub test_period: (DateTime<Utc>, DateTime<Utc>),
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    /// Test log-loss, when the learner exposes probabilities
    pub test_log_loss: Option<f64>,
    /// Most important features, descending
    pub feature_importances: Vec<(String, f64)>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Target: {}", self.target)?;
        writeln!(
            f,
            "Train: {} rows ({} .. {})",
            self.train_rows, self.train_period.0, self.train_period.1
        )?;
        writeln!(
            f,
            "Test:  {} rows ({} .. {})",
            self.test_rows, self.test_period.0, self.test_period.1
        )?;
        writeln!(
            f,
            "Features ({}): {}",
            self.feature_names.len(),
            self.feature_names.join(", ")
        )?;
        writeln!(f)?;
        writeln!(f, "Classification Report:")?;
        writeln!(f, "{}", self.report)?;
        writeln!(f, "Confusion Matrix:")?;
        writeln!(f, "{}", self.confusion)?;

        if let Some(loss) = self.test_log_loss {
            writeln!(f)?;
            writeln!(f, "Test logloss: {:.4}", loss)?;
        }

        if !self.feature_importances.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top Feature Importances:")?;
            for (i, (name, importance)) in self.feature_importances.iter().enumerate() {
                writeln!(f, "{:2}. {:15} {:.4}", i + 1, name, importance)?;
            }
        }
        Ok(())
    }
}

/// Trains a classifier on the earliest rows and evaluates on the latest
#[derive(Debug, Clone)]
pub struct Trainer<C: Classifier = GbmClassifier> {
    classifier: C,
    config: TrainingConfig,
    label_columns: Vec<String>,
}

impl Trainer<GbmClassifier> {
    /// Trainer using the gradient boosting classifier configured in `config`
    pub fn gbm(config: TrainingConfig, label_columns: Vec<String>) -> Self {
        let classifier = GbmClassifier::with_params(config.gbm.clone());
        Self::with_classifier(classifier, config, label_columns)
    }
}

impl<C: Classifier> Trainer<C> {
    /// `label_columns` names every label column in the table; all of them
    /// are withheld from the learner
    pub fn with_classifier(classifier: C, config: TrainingConfig, label_columns: Vec<String>) -> Self {
        Self {
            classifier,
            config,
            label_columns,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Build the learner dataset: every column except labels and `close`
    pub fn dataset(&self, labeled: &Frame) -> Result<Dataset> {
        Dataset::from_frame(labeled, &self.config.target, &self.label_columns)
    }

    /// Split, fit, predict and score; the fitted model is dropped afterwards
    pub fn evaluate(&self, labeled: &Frame) -> Result<EvaluationReport> {
        self.config.validate()?;
        let dataset = self.dataset(labeled)?;

        let required = self.config.min_rows();
        if dataset.n_samples() < required {
            return Err(PipelineError::InsufficientData {
                required,
                actual: dataset.n_samples(),
            });
        }

        let split = dataset.train_test_split(self.config.train_ratio);
        let (train, test) = (&split.train, &split.test);
        info!(
            "Split {} rows into {} train / {} test for {}",
            dataset.n_samples(),
            train.n_samples(),
            test.n_samples(),
            self.config.target
        );

        let model = self.classifier.fit(train.features_view(), &train.labels)?;
        let predictions = self.classifier.predict(&model, test.features_view())?;
        if predictions.len() != test.n_samples() {
            return Err(ModelError::PredictionFailed(format!(
                "classifier returned {} predictions for {} test rows",
                predictions.len(),
                test.n_samples()
            ))
            .into());
        }
        let test_log_loss = self
            .classifier
            .predict_proba(&model, test.features_view())?
            .map(|probs| log_loss(&test.labels, &probs));

        let confusion = ConfusionMatrix::from_labels(&test.labels, &predictions);
        let report = ClassificationReport::from_confusion(&confusion);
        info!("Test accuracy for {}: {:.4}", self.config.target, report.accuracy);

        let mut feature_importances: Vec<(String, f64)> = self
            .classifier
            .feature_importances(&model)
            .map(|imps| dataset.feature_names.iter().cloned().zip(imps).collect())
            .unwrap_or_default();
        feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));
        feature_importances.truncate(self.config.top_features);

        Ok(EvaluationReport {
            target: self.config.target.clone(),
            feature_names: dataset.feature_names.clone(),
            train_rows: train.n_samples(),
            test_rows: test.n_samples(),
            train_period: period(&train.timestamps),
            test_period: period(&test.timestamps),
            confusion,
            report,
            test_log_loss,
            feature_importances,
        })
    }
}

/// First and last timestamp of a non-empty split
fn period(timestamps: &[DateTime<Utc>]) -> (DateTime<Utc>, DateTime<Utc>) {
    match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => (DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MIN_UTC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use ndarray::ArrayView2;
    use std::cell::RefCell;

    /// Predicts the majority training class and remembers the matrix width
    #[derive(Default)]
    struct MajorityClassifier {
        seen_features: RefCell<Option<usize>>,
    }

    impl Classifier for MajorityClassifier {
        type Model = u8;

        fn fit(&self, features: ArrayView2<'_, f64>, labels: &[u8]) -> std::result::Result<u8, ModelError> {
            *self.seen_features.borrow_mut() = Some(features.ncols());
            let ones = labels.iter().filter(|&&y| y == 1).count();
            Ok(u8::from(ones * 2 > labels.len()))
        }

        fn predict(&self, model: &u8, features: ArrayView2<'_, f64>) -> std::result::Result<Vec<u8>, ModelError> {
            Ok(vec![*model; features.nrows()])
        }
    }

    /// Always returns a single prediction
    struct OnePrediction;

    impl Classifier for OnePrediction {
        type Model = ();

        fn fit(&self, _features: ArrayView2<'_, f64>, _labels: &[u8]) -> std::result::Result<(), ModelError> {
            Ok(())
        }

        fn predict(&self, _model: &(), _features: ArrayView2<'_, f64>) -> std::result::Result<Vec<u8>, ModelError> {
            Ok(vec![1])
        }
    }

    fn labeled_frame(n: usize) -> Frame {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut frame = Frame::new((0..n).map(|i| start + Duration::minutes(i as i64)).collect());
        let wave: Vec<f64> = (0..n).map(|i| (i as f64 * 0.7).sin()).collect();
        frame.push_column("close", (0..n).map(|i| 100.0 + i as f64).collect()).unwrap();
        frame.push_column("rsi_14", wave.iter().map(|w| 50.0 + 30.0 * w).collect()).unwrap();
        frame.push_column("macd", wave.clone()).unwrap();
        frame.push_column("target_1m", wave.iter().map(|&w| if w > 0.0 { 1.0 } else { 0.0 }).collect()).unwrap();
        frame.push_column("target_5m", vec![1.0; n]).unwrap();
        frame
    }

    fn label_columns() -> Vec<String> {
        vec!["target_1m".to_string(), "target_5m".to_string()]
    }

    #[test]
    fn test_evaluate_with_gbm() {
        let trainer = Trainer::gbm(
            TrainingConfig {
                gbm: GbmParams {
                    n_estimators: 20,
                    ..Default::default()
                },
                ..Default::default()
            },
            label_columns(),
        );

        let report = trainer.evaluate(&labeled_frame(101)).unwrap();

        assert_eq!(report.train_rows, 80);
        assert_eq!(report.test_rows, 21);
        assert!(report.train_period.1 < report.test_period.0);
        assert_eq!(report.feature_names, vec!["rsi_14", "macd"]);
        assert_eq!(report.confusion.total(), 21);
        assert!(report.test_log_loss.is_some());
        assert!(report.report.accuracy > 0.8);
        assert!(!report.feature_importances.is_empty());

        let text = report.to_string();
        assert!(text.contains("Classification Report:"));
        assert!(text.contains("Confusion Matrix:"));
    }

    #[test]
    fn test_learner_never_sees_close_or_labels() {
        let classifier = MajorityClassifier::default();
        let trainer = Trainer::with_classifier(classifier, TrainingConfig::default(), label_columns());

        let report = trainer.evaluate(&labeled_frame(50)).unwrap();

        assert_eq!(*trainer.classifier.seen_features.borrow(), Some(2));
        for excluded in ["close", "target_1m", "target_5m"] {
            assert!(!report.feature_names.iter().any(|n| n == excluded));
        }
        assert!(report.test_log_loss.is_none());
        assert!(report.feature_importances.is_empty());
    }

    #[test]
    fn test_target_5m_with_pluggable_classifier() {
        let config = TrainingConfig {
            target: "target_5m".to_string(),
            ..Default::default()
        };
        let trainer = Trainer::with_classifier(MajorityClassifier::default(), config, label_columns());

        let report = trainer.evaluate(&labeled_frame(30)).unwrap();

        assert_eq!(report.confusion.get(1, 1), 6);
        assert_eq!(report.report.accuracy, 1.0);
    }

    #[test]
    fn test_missing_target_is_config_error() {
        let frame = labeled_frame(30).without_columns(&["target_1m"]);
        let trainer = Trainer::gbm(TrainingConfig::default(), label_columns());

        assert!(matches!(
            trainer.evaluate(&frame),
            Err(PipelineError::TrainingConfig(_))
        ));
    }

    #[test]
    fn test_empty_feature_set_is_config_error() {
        let frame = labeled_frame(30).without_columns(&["rsi_14", "macd"]);
        let trainer = Trainer::gbm(TrainingConfig::default(), label_columns());

        assert!(matches!(
            trainer.evaluate(&frame),
            Err(PipelineError::TrainingConfig(_))
        ));
    }

    #[test]
    fn test_too_few_rows_to_split() {
        let trainer = Trainer::gbm(TrainingConfig::default(), label_columns());

        assert!(matches!(
            trainer.evaluate(&labeled_frame(1)),
            Err(PipelineError::InsufficientData { required: 2, actual: 1 })
        ));
        assert!(trainer.evaluate(&labeled_frame(2)).is_ok());
    }

    #[test]
    fn test_invalid_train_ratio() {
        let config = TrainingConfig {
            train_ratio: 1.0,
            ..Default::default()
        };
        let trainer = Trainer::gbm(config, label_columns());

        assert!(matches!(
            trainer.evaluate(&labeled_frame(30)),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_prediction_count_mismatch_is_an_error() {
        let trainer = Trainer::with_classifier(OnePrediction, TrainingConfig::default(), label_columns());

        assert!(matches!(
            trainer.evaluate(&labeled_frame(30)),
            Err(PipelineError::Model(ModelError::PredictionFailed(_)))
        ));
    }

    #[test]
    fn test_min_rows_for_small_ratios() {
        let ratio = |train_ratio| TrainingConfig {
            train_ratio,
            ..Default::default()
        };

        assert_eq!(ratio(0.8).min_rows(), 2);
        assert_eq!(ratio(0.5).min_rows(), 2);
        assert_eq!(ratio(0.3).min_rows(), 4);
        assert_eq!(ratio(0.1).min_rows(), 10);

        let trainer = Trainer::gbm(ratio(1e-12), label_columns());
        assert!(matches!(
            trainer.evaluate(&labeled_frame(30)),
            Err(PipelineError::InsufficientData { actual: 30, required }) if required >= 1_000_000_000_000
        ));
    }
}

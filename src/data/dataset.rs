//! Dataset structure for machine learning
//!
//! A [`Dataset`] is the learner-facing view of a labeled table: a dense
//! feature matrix with one binary label per row.

use super::types::{Frame, CLOSE_COLUMN};
use crate::error::{PipelineError, Result};
use crate::labels::LabelConfig;
use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView2};

/// Feature matrix with binary labels
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix (n_samples x n_features)
    pub features: Array2<f64>,
    /// Binary labels (0 = down/flat, 1 = up)
    pub labels: Vec<u8>,
    /// Feature names, one per matrix column
    pub feature_names: Vec<String>,
    /// Timestamps for each sample
    pub timestamps: Vec<DateTime<Utc>>,
}

/// Train/test split result
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    /// Build a dataset from a labeled table
    ///
    /// `label_columns` lists the configured label columns and `target` must be
    /// one of them. Every label column in the table, configured or merely
    /// `target_<h>m`-shaped, is kept out of the feature matrix together with
    /// the raw close price.
    pub fn from_frame(frame: &Frame, target: &str, label_columns: &[String]) -> Result<Self> {
        if !label_columns.iter().any(|c| c == target) {
            return Err(PipelineError::TrainingConfig(format!(
                "`{}` is not a label column (expected one of: {})",
                target,
                label_columns.join(", ")
            )));
        }
        let target_values = frame.column(target).ok_or_else(|| {
            PipelineError::TrainingConfig(format!("target column `{}` is missing", target))
        })?;

        let labels = target_values
            .iter()
            .enumerate()
            .map(|(row, &v)| match v {
                v if v == 0.0 => Ok(0u8),
                v if v == 1.0 => Ok(1u8),
                other => Err(PipelineError::TrainingConfig(format!(
                    "target `{}` must be 0 or 1, found {} at row {}",
                    target, other, row
                ))),
            })
            .collect::<Result<Vec<u8>>>()?;

        let excluded: Vec<&str> = label_columns
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(CLOSE_COLUMN))
            .collect();

        let feature_columns: Vec<_> = frame
            .columns()
            .iter()
            .filter(|c| !excluded.contains(&c.name.as_str()))
            .filter(|c| !LabelConfig::is_label_column(&c.name))
            .collect();

        if feature_columns.is_empty() {
            return Err(PipelineError::TrainingConfig(
                "feature matrix is empty after excluding labels and close".to_string(),
            ));
        }

        let features = Array2::from_shape_fn((frame.len(), feature_columns.len()), |(i, j)| {
            feature_columns[j].values[i]
        });

        Ok(Self {
            features,
            labels,
            feature_names: feature_columns.iter().map(|c| c.name.clone()).collect(),
            timestamps: frame.timestamps().to_vec(),
        })
    }

    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Number of features
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn features_view(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Split into train and test sets by position
    ///
    /// The first `floor(train_ratio * n)` rows form the training set; no
    /// shuffling, so every training row precedes every test row in time.
    pub fn train_test_split(&self, train_ratio: f64) -> Split {
        let n = self.n_samples();
        let train_size = ((n as f64 * train_ratio).floor() as usize).min(n);

        Split {
            train: self.rows(0, train_size),
            test: self.rows(train_size, n),
        }
    }

    fn rows(&self, start: usize, end: usize) -> Dataset {
        Dataset {
            features: self.features.slice(ndarray::s![start..end, ..]).to_owned(),
            labels: self.labels[start..end].to_vec(),
            feature_names: self.feature_names.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn labeled_frame(n: usize) -> Frame {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut frame = Frame::new((0..n).map(|i| start + Duration::minutes(i as i64)).collect());
        let ramp: Vec<f64> = (0..n).map(|i| i as f64).collect();
        frame.push_column("open", ramp.clone()).unwrap();
        frame.push_column("close", ramp.clone()).unwrap();
        frame.push_column("rsi_14", vec![50.0; n]).unwrap();
        frame.push_column("target_1m", (0..n).map(|i| (i % 2) as f64).collect()).unwrap();
        frame.push_column("target_5m", vec![1.0; n]).unwrap();
        frame
    }

    fn label_columns() -> Vec<String> {
        vec!["target_1m".to_string(), "target_5m".to_string()]
    }

    #[test]
    fn test_from_frame_excludes_close_and_labels() {
        let dataset = Dataset::from_frame(&labeled_frame(10), "target_1m", &label_columns()).unwrap();

        assert_eq!(dataset.feature_names, vec!["open", "rsi_14"]);
        assert_eq!(dataset.features.dim(), (10, 2));
        assert_eq!(dataset.labels[..4], [0, 1, 0, 1]);
    }

    #[test]
    fn test_from_frame_rejects_unknown_target() {
        let frame = labeled_frame(4);

        assert!(matches!(
            Dataset::from_frame(&frame, "target_15m", &label_columns()),
            Err(PipelineError::TrainingConfig(_))
        ));
        let without = frame.without_columns(&["target_5m"]);
        assert!(matches!(
            Dataset::from_frame(&without, "target_5m", &label_columns()),
            Err(PipelineError::TrainingConfig(_))
        ));
    }

    #[test]
    fn test_from_frame_excludes_unconfigured_labels() {
        let mut frame = labeled_frame(10);
        frame.push_column("target_15m", vec![0.0; 10]).unwrap();
        let configured = vec!["target_1m".to_string()];

        let dataset = Dataset::from_frame(&frame, "target_1m", &configured).unwrap();

        assert_eq!(dataset.feature_names, vec!["open", "rsi_14"]);
    }

    #[test]
    fn test_from_frame_rejects_empty_feature_set() {
        let frame = labeled_frame(4).without_columns(&["open", "rsi_14"]);

        assert!(matches!(
            Dataset::from_frame(&frame, "target_1m", &label_columns()),
            Err(PipelineError::TrainingConfig(msg)) if msg.contains("empty")
        ));
    }

    #[test]
    fn test_from_frame_rejects_non_binary_target() {
        let mut frame = labeled_frame(4);
        frame.push_column("target_1m", vec![0.0, 1.0, 2.0, 1.0]).unwrap();

        assert!(Dataset::from_frame(&frame, "target_1m", &label_columns()).is_err());
    }

    #[test]
    fn test_train_test_split_is_chronological() {
        let dataset = Dataset::from_frame(&labeled_frame(13), "target_5m", &label_columns()).unwrap();
        let split = dataset.train_test_split(0.8);

        assert_eq!(split.train.n_samples(), 10);
        assert_eq!(split.test.n_samples(), 3);
        assert!(split.train.timestamps.last().unwrap() < split.test.timestamps.first().unwrap());
        assert_eq!(split.test.features[[0, 0]], 10.0);
    }
}

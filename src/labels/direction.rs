//! Binary price-direction labels

use crate::data::{Frame, CLOSE_COLUMN};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Labeling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Look-ahead horizons in rows (one row per minute)
    pub horizons: Vec<usize>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            horizons: vec![1, 5],
        }
    }
}

impl LabelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.horizons.is_empty() || self.horizons.contains(&0) {
            return Err(PipelineError::Config(
                "label horizons must be a non-empty list of positive row offsets".to_string(),
            ));
        }
        Ok(())
    }

    /// Column name for a horizon, e.g. `target_5m`
    pub fn column_name(horizon: usize) -> String {
        format!("target_{}m", horizon)
    }

    /// Whether `name` has the shape of a label column (`target_<h>m`)
    ///
    /// Holds for every horizon, configured or not, so a table labeled under
    /// a different configuration still has all its labels recognized.
    pub fn is_label_column(name: &str) -> bool {
        name.strip_prefix("target_")
            .and_then(|rest| rest.strip_suffix('m'))
            .map_or(false, |h| !h.is_empty() && h.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Every label column this configuration produces
    pub fn label_columns(&self) -> Vec<String> {
        self.horizons.iter().map(|&h| Self::column_name(h)).collect()
    }

    /// Longest look-ahead horizon
    pub fn max_horizon(&self) -> usize {
        self.horizons.iter().copied().max().unwrap_or(0)
    }
}

/// Appends direction labels computed from future closes
#[derive(Debug, Clone, Default)]
pub struct Labeler {
    config: LabelConfig,
}

impl Labeler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LabelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Label each row with `1` if the close `h` rows later is higher, else `0`
    ///
    /// The trailing `max_horizon` rows have no complete set of future closes
    /// and are dropped. Future closes are only used to compute the labels
    /// and never appear as columns.
    pub fn label(&self, features: &Frame) -> Result<Frame> {
        self.config.validate()?;
        let closes = features.require(CLOSE_COLUMN)?;

        let max_horizon = self.config.max_horizon();
        let required = max_horizon + 1;
        if features.len() < required {
            return Err(PipelineError::InsufficientData {
                required,
                actual: features.len(),
            });
        }

        let keep = features.len() - max_horizon;
        let mut table = features.slice(0..keep);

        for &horizon in &self.config.horizons {
            let future_closes = &closes[horizon..];
            let labels: Vec<f64> = closes[..keep]
                .iter()
                .zip(future_closes)
                .map(|(now, later)| if later > now { 1.0 } else { 0.0 })
                .collect();
            table.push_column(LabelConfig::column_name(horizon), labels)?;
        }

        info!(
            "Labeled {} rows with horizons {:?} ({} trailing rows dropped)",
            table.len(),
            self.config.horizons,
            max_horizon
        );

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn frame_with_closes(closes: &[f64]) -> Frame {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut frame = Frame::new(
            (0..closes.len())
                .map(|i| start + Duration::minutes(i as i64))
                .collect(),
        );
        frame.push_column("close", closes.to_vec()).unwrap();
        frame.push_column("rsi_14", vec![50.0; closes.len()]).unwrap();
        frame
    }

    #[test]
    fn test_rising_prices_are_all_up() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let labeled = Labeler::new().label(&frame_with_closes(&closes)).unwrap();

        assert_eq!(labeled.len(), 55);
        assert!(labeled.column("target_1m").unwrap().iter().all(|&v| v == 1.0));
        assert!(labeled.column("target_5m").unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_labels_match_future_comparison() {
        let closes: Vec<f64> = (0..40).map(|i| ((i * 7) % 11) as f64).collect();
        let input = frame_with_closes(&closes);
        let labeled = Labeler::new().label(&input).unwrap();

        assert_eq!(labeled.len(), closes.len() - 5);
        assert_eq!(labeled.timestamps(), &input.timestamps()[..closes.len() - 5]);

        let t1 = labeled.column("target_1m").unwrap();
        let t5 = labeled.column("target_5m").unwrap();
        for i in 0..labeled.len() {
            assert_eq!(t1[i] == 1.0, closes[i + 1] > closes[i], "target_1m at row {}", i);
            assert_eq!(t5[i] == 1.0, closes[i + 5] > closes[i], "target_5m at row {}", i);
        }
    }

    #[test]
    fn test_equal_future_close_is_not_up() {
        let labeled = Labeler::new().label(&frame_with_closes(&[5.0; 8])).unwrap();

        assert!(labeled.column("target_1m").unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_no_helper_columns_remain() {
        let labeled = Labeler::new().label(&frame_with_closes(&[1.0; 10])).unwrap();

        assert_eq!(
            labeled.column_names(),
            vec!["close", "rsi_14", "target_1m", "target_5m"]
        );
    }

    #[test]
    fn test_minimum_rows() {
        let labeled = Labeler::new()
            .label(&frame_with_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
            .unwrap();
        assert_eq!(labeled.len(), 1);

        let err = Labeler::new()
            .label(&frame_with_closes(&[1.0, 2.0, 3.0, 4.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                required: 6,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_label_column_shape() {
        assert!(LabelConfig::is_label_column("target_1m"));
        assert!(LabelConfig::is_label_column("target_60m"));
        assert!(!LabelConfig::is_label_column("target_m"));
        assert!(!LabelConfig::is_label_column("target_5"));
        assert!(!LabelConfig::is_label_column("ema_20"));
    }

    #[test]
    fn test_missing_close_is_schema_error() {
        let frame = frame_with_closes(&[1.0; 10]).without_columns(&["close"]);

        assert!(matches!(
            Labeler::new().label(&frame),
            Err(PipelineError::Schema(_))
        ));
    }
}

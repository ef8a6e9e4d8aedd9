//! Feature table construction
//!
//! Turns a raw OHLCV table into the feature table by appending indicator
//! columns and trimming the warm-up prefix where any indicator is undefined.

use crate::data::{Frame, CLOSE_COLUMN, OHLCV_COLUMNS};
use crate::error::{PipelineError, Result};
use crate::features::technical::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Feature engineering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Period for RSI
    pub rsi_period: usize,
    /// MACD parameters (fast, slow, signal)
    pub macd_params: (usize, usize, usize),
    /// Periods for exponential moving averages of close
    pub ema_periods: Vec<usize>,
    /// Window for the rolling standard deviation of close
    pub volatility_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_params: (12, 26, 9),
            ema_periods: vec![20, 50],
            volatility_window: 10,
        }
    }
}

impl FeatureConfig {
    /// Check that every period is usable
    pub fn validate(&self) -> Result<()> {
        let (fast, slow, signal) = self.macd_params;
        if self.rsi_period == 0 || fast == 0 || slow == 0 || signal == 0 {
            return Err(PipelineError::Config(
                "indicator periods must be positive".to_string(),
            ));
        }
        if self.ema_periods.iter().any(|&p| p == 0) {
            return Err(PipelineError::Config("EMA periods must be positive".to_string()));
        }
        if self.volatility_window < 2 {
            return Err(PipelineError::Config(
                "volatility window must cover at least 2 rows".to_string(),
            ));
        }
        Ok(())
    }

    /// Names of the derived columns, in output order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![
            format!("rsi_{}", self.rsi_period),
            "macd".to_string(),
            "macd_signal".to_string(),
        ];
        names.extend(self.ema_periods.iter().map(|p| format!("ema_{}", p)));
        names.push("volatility".to_string());
        names
    }

    /// Number of leading rows where at least one indicator is undefined
    pub fn warmup(&self) -> usize {
        let (fast, slow, signal) = self.macd_params;
        let ema_warmups = self.ema_periods.iter().map(|&p| ema_warmup(p));

        [
            rsi_warmup(self.rsi_period),
            macd_signal_warmup(fast, slow, signal),
            rolling_std_warmup(self.volatility_window),
        ]
        .into_iter()
        .chain(ema_warmups)
        .max()
        .unwrap_or(0)
    }
}

/// Builds the feature table from raw OHLCV data
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a new feature builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new feature builder with custom configuration
    pub fn with_config(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Compute indicators and drop the warm-up rows
    ///
    /// The input is never modified. Every derived value depends only on rows
    /// at or before its own timestamp.
    pub fn build(&self, raw: &Frame) -> Result<Frame> {
        self.config.validate()?;
        raw.require_all(&OHLCV_COLUMNS)?;
        raw.validate_index()?;
        raw.validate_finite(&OHLCV_COLUMNS)?;

        let closes = raw.require(CLOSE_COLUMN)?;
        let (fast, slow, signal) = self.config.macd_params;

        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(self.config.ema_periods.len() + 4);
        columns.push(rsi(closes, self.config.rsi_period));
        let macd_result = macd(closes, fast, slow, signal);
        columns.push(macd_result.macd_line);
        columns.push(macd_result.signal_line);
        for &period in &self.config.ema_periods {
            columns.push(ema(closes, period));
        }
        columns.push(rolling_std(closes, self.config.volatility_window));

        let mut table = raw.clone();
        for (name, values) in self.config.feature_names().into_iter().zip(columns) {
            table.push_column(name, values)?;
        }

        let warmup = self.config.warmup().min(table.len());
        let table = table.slice(warmup..table.len());

        if table.is_empty() {
            warn!(
                "{} input rows do not cover the {}-row indicator warm-up; feature table is empty",
                raw.len(),
                warmup
            );
        } else {
            info!(
                "Built {} feature rows from {} raw rows ({} warm-up rows dropped)",
                table.len(),
                raw.len(),
                warmup
            );
        }

        Ok(table)
    }
}

//! Configuration management
//!
//! Provides unified configuration for every pipeline stage. Every field has
//! a default, so a TOML file only needs the values it overrides.

use crate::error::{PipelineError, Result};
use crate::features::FeatureConfig;
use crate::labels::LabelConfig;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stage input/output locations
    pub paths: PathsConfig,
    /// Indicator periods
    pub features: FeatureConfig,
    /// Look-ahead horizons
    pub labels: LabelConfig,
    /// Target, split and classifier settings
    pub training: TrainingConfig,
}

/// File locations shared by the stage binaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw 1-minute OHLCV table
    pub raw: PathBuf,
    /// Feature table
    pub features: PathBuf,
    /// Labeled table
    pub labeled: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw: PathBuf::from("data/raw/btc_1m.csv"),
            features: PathBuf::from("data/processed/btc_1m_features.csv"),
            labeled: PathBuf::from("data/processed/btc_1m_labeled.csv"),
        }
    }
}

impl PipelineConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: PipelineConfig = toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| PipelineError::io(path, e))
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.labels.validate()?;
        self.training.validate()?;
        self.training.gbm.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new();

        assert_eq!(config.paths.raw, PathBuf::from("data/raw/btc_1m.csv"));
        assert_eq!(config.features.rsi_period, 14);
        assert_eq!(config.labels.horizons, vec![1, 5]);
        assert_eq!(config.training.target, "target_1m");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(
            &path,
            "[training]\ntarget = \"target_5m\"\n\n[training.gbm]\nn_estimators = 50\n",
        )
        .unwrap();

        let config = PipelineConfig::from_toml(&path).unwrap();

        assert_eq!(config.training.target, "target_5m");
        assert_eq!(config.training.gbm.n_estimators, 50);
        assert_eq!(config.training.gbm.max_depth, 6);
        assert_eq!(config.features, FeatureConfig::default());
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");

        let mut config = PipelineConfig::default();
        config.features.ema_periods = vec![10, 30];
        config.training.train_ratio = 0.7;
        config.save_toml(&path).unwrap();

        assert_eq!(PipelineConfig::from_toml(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[labels]\nhorizons = []\n").unwrap();

        assert!(matches!(
            PipelineConfig::from_toml(&path),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = PipelineConfig::from_toml(dir.path().join("absent.toml"));

        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }
}

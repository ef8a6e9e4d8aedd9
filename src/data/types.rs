//! Data types for minute-bar market data
//!
//! [`Frame`] is the table handed from stage to stage: a timestamp index plus
//! named numeric columns kept in insertion order.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Name of the index column in every pipeline file
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Raw OHLCV columns, in file order
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Closing price column
pub const CLOSE_COLUMN: &str = "close";

/// OHLCV (Open, High, Low, Close, Volume) candle data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

/// A named numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Timestamp-indexed table of numeric columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl Frame {
    /// Create a frame with an index and no columns
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Build a raw OHLCV frame from candles
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut frame = Self::new(candles.iter().map(|c| c.timestamp).collect());
        let fields: [fn(&Candle) -> f64; 5] = [
            |c| c.open,
            |c| c.high,
            |c| c.low,
            |c| c.close,
            |c| c.volume,
        ];

        for (name, field) in OHLCV_COLUMNS.iter().zip(fields) {
            frame.columns.push(Column {
                name: name.to_string(),
                values: candles.iter().map(field).collect(),
            });
        }

        frame
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Look up a column that the caller cannot do without
    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name)
            .ok_or_else(|| PipelineError::Schema(format!("required column `{}` is missing", name)))
    }

    /// Check that every named column is present
    pub fn require_all(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Schema(format!(
                "required columns missing: {}",
                missing.join(", ")
            )))
        }
    }

    /// Append a column, replacing any existing column with the same name
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(PipelineError::Schema(format!(
                "column `{}` has {} values but the frame has {} rows",
                name,
                values.len(),
                self.len()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Copy of the frame without the named columns
    pub fn without_columns(&self, names: &[&str]) -> Frame {
        Frame {
            timestamps: self.timestamps.clone(),
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Copy of a contiguous range of rows
    pub fn slice(&self, range: Range<usize>) -> Frame {
        Frame {
            timestamps: self.timestamps[range.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[range.clone()].to_vec(),
                })
                .collect(),
        }
    }

    /// Fail unless timestamps are strictly increasing
    pub fn validate_index(&self) -> Result<()> {
        for (i, pair) in self.timestamps.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(PipelineError::Schema(format!(
                    "timestamps must be strictly increasing: row {} ({}) follows {}",
                    i + 1,
                    pair[1],
                    pair[0]
                )));
            }
        }
        Ok(())
    }

    /// Fail if any of the named columns holds a NaN or infinite value
    pub fn validate_finite(&self, names: &[&str]) -> Result<()> {
        for name in names {
            let values = self.require(name)?;
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(PipelineError::Schema(format!(
                    "column `{}` has a non-finite value at row {}",
                    name, row
                )));
            }
        }
        Ok(())
    }
}

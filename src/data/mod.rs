//! Data module for minute-bar tables
//!
//! This module provides:
//! - Timestamp-indexed tables and candle records
//! - CSV loading and saving
//! - Dataset structures for machine learning

pub mod dataset;
pub mod loader;
pub mod types;

pub use dataset::{Dataset, Split};
pub use loader::{load_frame, save_frame};
pub use types::{Candle, Column, Frame, CLOSE_COLUMN, OHLCV_COLUMNS, TIMESTAMP_COLUMN};

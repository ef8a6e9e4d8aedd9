//! Feature engineering module
//!
//! This module provides:
//! - Technical indicators (RSI, MACD, EMA, rolling volatility)
//! - Feature table construction with warm-up trimming

pub mod engineering;
pub mod technical;

pub use engineering::{FeatureBuilder, FeatureConfig};

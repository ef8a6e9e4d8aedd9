//! Lookahead labeling
//!
//! Labels are the only place where future prices enter a table, and they
//! never become model inputs.

pub mod direction;

pub use direction::{LabelConfig, Labeler};

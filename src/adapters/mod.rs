//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external systems:
//! - `logistic`: JSON-exported logistic model and feature scaler
//! - `anthropic`: remote reasoning provider over HTTP
//! - `sanitize`: secret/PII filtering for logs

pub mod anthropic;
pub mod logistic;
pub mod sanitize;

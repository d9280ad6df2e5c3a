//! Core domain types and logic.

pub mod series;
pub mod validate;
pub mod indicator;
pub mod signal;
pub mod backtest;
pub mod metrics;
pub mod portfolio;
pub mod sync;
pub mod monitor;
pub mod error;

//! Rendering boundary for human-readable output.

use crate::domain::error::FundwatchError;
use crate::domain::monitor::{InstrumentOutcome, MonitorReport};
use crate::domain::portfolio::Recommendation;

/// Renders batch results. Implementations decide format and target.
pub trait ReportPort {
    /// Signal table plus benchmark summary.
    fn write_signal_report(&self, report: &MonitorReport) -> Result<(), FundwatchError>;

    /// Backtest leaderboard over the same outcomes.
    fn write_backtest_report(&self, outcomes: &[InstrumentOutcome]) -> Result<(), FundwatchError>;

    /// Top-N buy picks with allocations.
    fn write_recommendations(&self, picks: &[Recommendation]) -> Result<(), FundwatchError>;
}

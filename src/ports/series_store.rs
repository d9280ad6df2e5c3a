//! Persistence boundary for per-instrument valuation series.

use crate::domain::error::FundwatchError;
use crate::domain::series::ValuationRecord;

/// Loads and saves one series per instrument code.
///
/// `Sync` so a batch run can share one store across workers.
pub trait SeriesStore: Sync {
    /// Full local history for `code`, ascending by date. A code that
    /// has never been saved yields an empty vector, not an error.
    fn load(&self, code: &str) -> Result<Vec<ValuationRecord>, FundwatchError>;

    /// Replace the stored series for `code` wholesale.
    fn save(&self, code: &str, records: &[ValuationRecord]) -> Result<(), FundwatchError>;

    /// Drop a corrupted series so the next sync rebuilds from scratch.
    fn invalidate(&self, code: &str) -> Result<(), FundwatchError>;
}

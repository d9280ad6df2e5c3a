//! Remote quote feed boundary.

use crate::domain::error::FundwatchError;
use crate::domain::series::ValuationRecord;

/// One page of a paginated valuation history, newest rows first as the
/// upstream serves them.
#[derive(Debug, Clone)]
pub struct QuotePage {
    pub records: Vec<ValuationRecord>,
    /// Total page count declared by the source for this instrument.
    pub total_pages: usize,
}

/// Paginated valuation feed. Page numbers start at 1.
pub trait QuoteSource: Sync {
    fn fetch_page(&self, code: &str, page: usize) -> Result<QuotePage, FundwatchError>;
}

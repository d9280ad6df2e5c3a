//! Daily valuation records and series merge logic.
//!
//! The canonical representation everywhere downstream is ascending by
//! date with no duplicate dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One published net value for one instrument on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    pub date: NaiveDate,
    pub value: f64,
}

impl ValuationRecord {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Latest date present in a series, the synchronization boundary.
pub fn watermark(records: &[ValuationRecord]) -> Option<NaiveDate> {
    records.iter().map(|r| r.date).max()
}

/// Merge a local series with freshly fetched rows.
///
/// Deduplicates by date with last-write-wins in favor of the new rows
/// and returns the union in ascending date order. Merging a series
/// with itself is a no-op.
pub fn merge(local: &[ValuationRecord], new: &[ValuationRecord]) -> Vec<ValuationRecord> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in local {
        by_date.insert(r.date, r.value);
    }
    for r in new {
        by_date.insert(r.date, r.value);
    }
    by_date
        .into_iter()
        .map(|(date, value)| ValuationRecord { date, value })
        .collect()
}

/// The trailing `n` rows of a series (the whole series when shorter).
pub fn tail(records: &[ValuationRecord], n: usize) -> &[ValuationRecord] {
    let start = records.len().saturating_sub(n);
    &records[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(date: &str, value: f64) -> ValuationRecord {
        ValuationRecord::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), value)
    }

    #[test]
    fn watermark_of_empty_is_none() {
        assert_eq!(watermark(&[]), None);
    }

    #[test]
    fn watermark_is_max_date_regardless_of_order() {
        let records = vec![rec("2024-01-03", 1.0), rec("2024-01-01", 1.1)];
        assert_eq!(
            watermark(&records),
            Some(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let records = vec![rec("2024-01-01", 1.0), rec("2024-01-02", 1.1)];
        let merged = merge(&records, &records);
        assert_eq!(merged, records);
    }

    #[test]
    fn merge_keeps_new_value_on_duplicate_date() {
        let local = vec![rec("2024-01-01", 1.0), rec("2024-01-02", 1.1)];
        let new = vec![rec("2024-01-02", 1.5), rec("2024-01-03", 1.2)];
        let merged = merge(&local, &new);

        assert_eq!(merged.len(), 3);
        assert!((merged[1].value - 1.5).abs() < f64::EPSILON);
        assert_eq!(merged[2], rec("2024-01-03", 1.2));
    }

    #[test]
    fn merge_sorts_ascending() {
        let local = vec![rec("2024-01-05", 1.0)];
        let new = vec![rec("2024-01-01", 0.9), rec("2024-01-03", 0.95)];
        let merged = merge(&local, &new);

        let dates: Vec<_> = merged.iter().map(|r| r.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn merge_with_empty_new_returns_local() {
        let local = vec![rec("2024-01-01", 1.0)];
        assert_eq!(merge(&local, &[]), local);
    }

    #[test]
    fn tail_shorter_than_n_returns_all() {
        let records = vec![rec("2024-01-01", 1.0), rec("2024-01-02", 1.1)];
        assert_eq!(tail(&records, 100).len(), 2);
    }

    #[test]
    fn tail_returns_last_n() {
        let records: Vec<_> = (1..=20)
            .map(|d| rec(&format!("2024-01-{d:02}"), d as f64))
            .collect();
        let t = tail(&records, 5);
        assert_eq!(t.len(), 5);
        assert_eq!(t[0].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }
}

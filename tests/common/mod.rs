#![allow(dead_code)]

use chrono::NaiveDate;
use fundwatch::domain::error::FundwatchError;
use fundwatch::domain::monitor::{MonitorConfig, MonitorSettings};
use fundwatch::domain::series::ValuationRecord;
use fundwatch::domain::sync::{PacingDelay, RetryPolicy};
use fundwatch::ports::quote_source::{QuotePage, QuoteSource};
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves a fixed paginated history per code, newest rows first as the
/// real feed does, and counts fetches.
pub struct MockQuoteSource {
    pages: HashMap<String, Vec<Vec<ValuationRecord>>>,
    failures: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockQuoteSource {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failures: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Register an ascending series, split into pages of `per` rows
    /// with the newest rows on page 1.
    pub fn with_series(mut self, code: &str, records: &[ValuationRecord], per: usize) -> Self {
        let mut newest_first: Vec<ValuationRecord> = records.to_vec();
        newest_first.sort_by_key(|r| std::cmp::Reverse(r.date));
        let pages: Vec<Vec<ValuationRecord>> = newest_first
            .chunks(per.max(1))
            .map(|c| c.to_vec())
            .collect();
        self.pages.insert(code.to_string(), pages);
        self
    }

    pub fn with_failure(mut self, code: &str, reason: &str) -> Self {
        self.failures.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn calls(&self, code: &str) -> usize {
        *self.calls.lock().unwrap().get(code).unwrap_or(&0)
    }
}

impl QuoteSource for MockQuoteSource {
    fn fetch_page(&self, code: &str, page: usize) -> Result<QuotePage, FundwatchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(code.to_string())
            .or_insert(0) += 1;

        if let Some(reason) = self.failures.get(code) {
            return Err(FundwatchError::TransientFetch {
                code: code.to_string(),
                reason: reason.clone(),
            });
        }

        let pages = self.pages.get(code).cloned().unwrap_or_default();
        let records = pages.get(page - 1).cloned().unwrap_or_default();
        Ok(QuotePage {
            records,
            total_pages: pages.len().max(1),
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn rec(date: NaiveDate, value: f64) -> ValuationRecord {
    ValuationRecord { date, value }
}

/// `n` consecutive daily rows starting at `start`.
pub fn linear_series(start: NaiveDate, n: usize, first: f64, step: f64) -> Vec<ValuationRecord> {
    (0..n)
        .map(|i| rec(start + chrono::Duration::days(i as i64), first + step * i as f64))
        .collect()
}

/// Oscillating series that keeps RSI defined and crosses the signal
/// thresholds both ways.
pub fn wavy_series(start: NaiveDate, n: usize) -> Vec<ValuationRecord> {
    (0..n)
        .map(|i| {
            rec(
                start + chrono::Duration::days(i as i64),
                1.0 + 0.2 * (i as f64 * 0.15).sin(),
            )
        })
        .collect()
}

/// Settings with retries, pacing and the benchmark index disabled, so
/// tests stay fast and deterministic.
pub fn test_settings() -> MonitorSettings {
    MonitorSettings {
        monitor: MonitorConfig {
            index_code: String::new(),
            workers: 2,
            ..MonitorConfig::default()
        },
        retry: RetryPolicy::none(),
        pacing: PacingDelay::default(),
        ..MonitorSettings::default()
    }
}

//! Incremental pull of remote valuation history.
//!
//! Pages are fetched oldest-watermark-aware: only rows strictly newer
//! than the local watermark are kept, and pagination stops as soon as
//! the feed reaches already-known dates. Each page fetch is wrapped in
//! an explicit retry policy; a randomized pacing pause sits between
//! pages out of politeness to the upstream.

use super::error::FundwatchError;
use super::series::ValuationRecord;
use crate::ports::QuoteSource;
use chrono::NaiveDate;
use rand::Rng;
use std::time::Duration;

/// Fixed-delay retry around one fallible operation. Only transient
/// errors are retried; anything else propagates immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// No retries and no sleeping, for tests and dry runs.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub fn run<T, F>(&self, mut op: F) -> Result<T, FundwatchError>
    where
        F: FnMut() -> Result<T, FundwatchError>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Random pause between page fetches. A zero `max_ms` disables it.
#[derive(Debug, Clone, Default)]
pub struct PacingDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl PacingDelay {
    pub fn pause(&self) {
        if self.max_ms == 0 || self.max_ms < self.min_ms {
            return;
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Watermark-driven page walker over a [`QuoteSource`].
pub struct Synchronizer<'a> {
    source: &'a dyn QuoteSource,
    retry: RetryPolicy,
    pacing: PacingDelay,
}

impl<'a> Synchronizer<'a> {
    pub fn new(source: &'a dyn QuoteSource, retry: RetryPolicy, pacing: PacingDelay) -> Self {
        Synchronizer {
            source,
            retry,
            pacing,
        }
    }

    /// Fetch every record strictly newer than `watermark`, ascending.
    ///
    /// With no watermark the full history is pulled. Stops on the
    /// first page with nothing new, on any row at or before the
    /// watermark, or at the declared page count. An empty result is a
    /// normal no-op, not an error.
    pub fn fetch_new(
        &self,
        code: &str,
        watermark: Option<NaiveDate>,
    ) -> Result<Vec<ValuationRecord>, FundwatchError> {
        let mut collected: Vec<ValuationRecord> = Vec::new();
        let mut page = 1;

        loop {
            let fetched = self.retry.run(|| self.source.fetch_page(code, page))?;

            match watermark {
                Some(wm) => {
                    let mut reached_known = false;
                    let mut newer = 0usize;
                    for record in &fetched.records {
                        if record.date > wm {
                            collected.push(record.clone());
                            newer += 1;
                        } else {
                            reached_known = true;
                        }
                    }
                    // A page with nothing new means the rest of the
                    // feed is older still.
                    if newer == 0 || reached_known {
                        break;
                    }
                }
                None => {
                    if fetched.records.is_empty() {
                        break;
                    }
                    collected.extend(fetched.records.iter().cloned());
                }
            }

            if page >= fetched.total_pages {
                break;
            }
            page += 1;
            self.pacing.pause();
        }

        collected.sort_by_key(|r| r.date);
        Ok(collected)
    }
}

//! Batch orchestration: sync, classify and backtest a list of
//! instruments, isolating per-instrument failures.

use super::backtest::{self, BacktestConfig, BacktestOutcome};
use super::error::FundwatchError;
use super::indicator::{self, IndicatorParams, IndicatorSnapshot};
use super::series::{self, ValuationRecord};
use super::signal::{self, Signal};
use super::sync::{PacingDelay, RetryPolicy, Synchronizer};
use super::validate::{self, ValidationConfig};
use crate::ports::{QuoteSource, SeriesStore};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Batch-level knobs.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Benchmark index analyzed alongside the funds.
    pub index_code: String,
    /// Trailing rows used for classification.
    pub classify_window: usize,
    /// Hour of day after which today's valuation is expected upstream.
    pub update_hour: u32,
    pub max_instruments: usize,
    /// Worker threads for the batch; 0 uses the default pool size.
    pub workers: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            index_code: "000300".to_string(),
            classify_window: 100,
            update_hour: 21,
            max_instruments: 10,
            workers: 5,
        }
    }
}

/// Everything the batch pipeline needs, bundled so workers share one
/// immutable view.
#[derive(Debug, Clone, Default)]
pub struct MonitorSettings {
    pub monitor: MonitorConfig,
    pub validation: ValidationConfig,
    pub indicators: IndicatorParams,
    pub backtest: BacktestConfig,
    pub retry: RetryPolicy,
    pub pacing: PacingDelay,
}

/// Per-instrument result of one batch run. `snapshot` is `None` when
/// the instrument could not be analyzed; `signal` is then Unavailable.
#[derive(Debug, Clone)]
pub struct InstrumentOutcome {
    pub code: String,
    pub snapshot: Option<IndicatorSnapshot>,
    pub signal: Signal,
    pub backtest: Option<BacktestOutcome>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl InstrumentOutcome {
    fn unavailable(code: &str, warnings: Vec<String>, error: String) -> Self {
        InstrumentOutcome {
            code: code.to_string(),
            snapshot: None,
            signal: Signal::unavailable(),
            backtest: None,
            warnings,
            error: Some(error),
        }
    }
}

/// Output of one full batch run.
#[derive(Debug, Clone)]
pub struct MonitorReport {
    pub generated_on: NaiveDate,
    pub index: Option<InstrumentOutcome>,
    pub instruments: Vec<InstrumentOutcome>,
}

/// The upstream publishes a day's valuation in the evening; before
/// `update_hour` the freshest possible local date is yesterday.
pub fn expected_latest_date(now: NaiveDateTime, update_hour: u32) -> NaiveDate {
    if now.time().hour() < update_hour {
        now.date() - chrono::Duration::days(1)
    } else {
        now.date()
    }
}

pub struct Monitor<'a> {
    store: &'a dyn SeriesStore,
    source: &'a dyn QuoteSource,
    settings: MonitorSettings,
}

impl<'a> Monitor<'a> {
    pub fn new(
        store: &'a dyn SeriesStore,
        source: &'a dyn QuoteSource,
        settings: MonitorSettings,
    ) -> Self {
        Monitor {
            store,
            source,
            settings,
        }
    }

    /// Sync one instrument and return its merged series plus warnings.
    ///
    /// A corrupted local file is invalidated and rebuilt from scratch.
    /// A merged series that fails validation discards the update and
    /// keeps the last known-good data. A transient fetch failure falls
    /// back to local data when enough of it exists.
    pub fn sync_instrument(
        &self,
        code: &str,
        expected: NaiveDate,
    ) -> Result<(Vec<ValuationRecord>, Vec<String>), FundwatchError> {
        let mut warnings = Vec::new();

        let mut local = self.store.load(code)?;
        if !local.is_empty() {
            let report = validate::validate(&local, code, &self.settings.validation);
            if !report.ok {
                warnings.push(format!(
                    "local series discarded: {}",
                    report.reason.unwrap_or_default()
                ));
                self.store.invalidate(code)?;
                local.clear();
            } else {
                warnings.extend(report.warnings);
            }
        }

        let watermark = series::watermark(&local);
        if watermark.is_some_and(|wm| wm >= expected)
            && local.len() >= self.settings.validation.min_rows
        {
            return Ok((local, warnings));
        }

        let sync = Synchronizer::new(
            self.source,
            self.settings.retry.clone(),
            self.settings.pacing.clone(),
        );
        let fetched = match sync.fetch_new(code, watermark) {
            Ok(fetched) => fetched,
            Err(e) if e.is_transient() && !local.is_empty() => {
                warnings.push(format!("sync failed, using local data: {e}"));
                return Ok((local, warnings));
            }
            Err(e) => return Err(e),
        };
        if fetched.is_empty() {
            return Ok((local, warnings));
        }

        let merged = series::merge(&local, &fetched);
        let report = validate::validate(&merged, code, &self.settings.validation);
        if !report.ok {
            warnings.push(format!(
                "merged series rejected, keeping previous data: {}",
                report.reason.unwrap_or_default()
            ));
            return Ok((local, warnings));
        }
        warnings.extend(report.warnings);

        self.store.save(code, &merged)?;
        Ok((merged, warnings))
    }

    /// Full pipeline for one instrument. Never panics or aborts the
    /// batch; failures come back as an unavailable outcome.
    pub fn analyze(&self, code: &str, expected: NaiveDate) -> InstrumentOutcome {
        let (records, warnings) = match self.sync_instrument(code, expected) {
            Ok(v) => v,
            Err(e) => return InstrumentOutcome::unavailable(code, Vec::new(), e.to_string()),
        };

        let window = series::tail(&records, self.settings.monitor.classify_window);
        let snapshots = match indicator::enrich(code, window, &self.settings.indicators) {
            Ok(s) => s,
            Err(e) => return InstrumentOutcome::unavailable(code, warnings, e.to_string()),
        };
        let latest = match snapshots.last() {
            Some(s) => s.clone(),
            None => {
                return InstrumentOutcome::unavailable(
                    code,
                    warnings,
                    "empty indicator output".to_string(),
                );
            }
        };
        let sig = signal::classify(&latest);

        let bt = backtest::run_backtest(
            code,
            &records,
            &self.settings.indicators,
            &self.settings.backtest,
        )
        .ok();

        InstrumentOutcome {
            code: code.to_string(),
            snapshot: Some(latest),
            signal: sig,
            backtest: bt,
            warnings,
            error: None,
        }
    }

    /// Run the batch over `codes` (deduplicated, order preserved,
    /// capped at `max_instruments`), then the benchmark index.
    pub fn run_batch(&self, codes: &[String], now: NaiveDateTime) -> MonitorReport {
        let expected = expected_latest_date(now, self.settings.monitor.update_hour);

        let mut seen = BTreeMap::new();
        let mut batch: Vec<&String> = Vec::new();
        for code in codes {
            if seen.insert(code.clone(), ()).is_none() {
                batch.push(code);
            }
            if batch.len() >= self.settings.monitor.max_instruments {
                break;
            }
        }

        let instruments: Vec<InstrumentOutcome> = match self.worker_pool() {
            Some(pool) => pool.install(|| {
                batch
                    .par_iter()
                    .map(|code| self.analyze(code.as_str(), expected))
                    .collect()
            }),
            None => batch
                .par_iter()
                .map(|code| self.analyze(code.as_str(), expected))
                .collect(),
        };

        let index = if self.settings.monitor.index_code.is_empty() {
            None
        } else {
            Some(self.analyze(&self.settings.monitor.index_code, expected))
        };

        MonitorReport {
            generated_on: now.date(),
            index,
            instruments,
        }
    }

    fn worker_pool(&self) -> Option<rayon::ThreadPool> {
        if self.settings.monitor.workers == 0 {
            return None;
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.monitor.workers)
            .build()
            .ok()
    }
}

//! Structural validation of a candidate series before anything
//! downstream trusts it.
//!
//! Hard checks reject the series; soft checks only produce warnings.
//! A series can be valid and still warn.

use super::series::ValuationRecord;

/// Tunables for the validator.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Minimum row count for any downstream indicator work.
    pub min_rows: usize,
    /// Consecutive missing calendar days tolerated before a gap warning.
    pub max_gap_days: i64,
    /// Sane value range; values outside warn but do not fail.
    pub sane_min: f64,
    pub sane_max: f64,
    /// Minimum rows ÷ calendar-day-span ratio before a coverage warning.
    pub min_coverage: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            min_rows: 26,
            max_gap_days: 14,
            sane_min: 0.01,
            sane_max: 100_000.0,
            min_coverage: 0.4,
        }
    }
}

/// Outcome of validating one series.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub ok: bool,
    pub reason: Option<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn fail(reason: String) -> Self {
        ValidationReport {
            ok: false,
            reason: Some(reason),
            warnings: Vec::new(),
        }
    }
}

/// Validate a candidate series for one instrument.
///
/// Hard failures: too few rows, non-finite or non-positive values,
/// duplicate dates. Records arrive already coerced (unparseable dates
/// or values never construct a [`ValuationRecord`]), so parseability
/// is enforced at the adapter boundary.
pub fn validate(records: &[ValuationRecord], code: &str, cfg: &ValidationConfig) -> ValidationReport {
    if records.len() < cfg.min_rows {
        return ValidationReport::fail(format!(
            "{}: {} rows, need at least {}",
            code,
            records.len(),
            cfg.min_rows
        ));
    }

    for r in records {
        if !r.value.is_finite() || r.value <= 0.0 {
            return ValidationReport::fail(format!("{}: bad value {} on {}", code, r.value, r.date));
        }
    }

    for pair in records.windows(2) {
        if pair[1].date <= pair[0].date {
            return ValidationReport::fail(format!(
                "{}: dates not strictly ascending at {}",
                code, pair[1].date
            ));
        }
    }

    let mut warnings = Vec::new();

    let mut worst_gap = 0i64;
    for pair in records.windows(2) {
        let gap = (pair[1].date - pair[0].date).num_days();
        if gap > worst_gap {
            worst_gap = gap;
        }
    }
    if worst_gap > cfg.max_gap_days {
        warnings.push(format!("{}: gap of {} calendar days", code, worst_gap));
    }

    let out_of_range = records
        .iter()
        .filter(|r| r.value < cfg.sane_min || r.value > cfg.sane_max)
        .count();
    if out_of_range > 0 {
        warnings.push(format!(
            "{}: {} values outside [{}, {}]",
            code, out_of_range, cfg.sane_min, cfg.sane_max
        ));
    }

    // A long uninterrupted decline is worth flagging for a net-value series.
    let mut run = 0usize;
    let mut worst_run = 0usize;
    for pair in records.windows(2) {
        if pair[1].value < pair[0].value {
            run += 1;
            worst_run = worst_run.max(run);
        } else {
            run = 0;
        }
    }
    if worst_run >= 10 {
        warnings.push(format!(
            "{}: {} consecutive declining values",
            code, worst_run
        ));
    }

    let span_days = (records[records.len() - 1].date - records[0].date).num_days();
    if span_days > 0 {
        let coverage = records.len() as f64 / span_days as f64;
        if coverage < cfg.min_coverage {
            warnings.push(format!("{}: low date coverage ({:.2})", code, coverage));
        }
    }

    ValidationReport {
        ok: true,
        reason: None,
        warnings,
    }
}

//! Technical indicator pipeline.
//!
//! Pure transforms over an ascending-date valuation series. Rolling
//! windows use a minimum-periods floor of 1, so values near the start
//! of a series are computed on partial windows. That early-window bias
//! is a deliberate compatibility choice and must be preserved, not
//! fixed; callers avoid decisions on warm-up rows instead.

pub mod ema;
pub mod macd;
pub mod bollinger;
pub mod rsi;
pub mod ma_ratio;

use super::error::FundwatchError;
use super::series::ValuationRecord;
use chrono::NaiveDate;

/// Indicator parameter set. Defaults match the monitor's fixed formulas.
#[derive(Debug, Clone)]
pub struct IndicatorParams {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    pub rsi_window: usize,
    pub ma_window: usize,
    /// Minimum series length before any indicator output is produced.
    pub min_rows: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_k: 2.0,
            rsi_window: 14,
            ma_window: 50,
            min_rows: 26,
        }
    }
}

/// All indicator values attached to one row of a series.
///
/// `rsi` is `None` where it is undefined (no deltas yet, or a window
/// with zero average loss). Every other column is defined from row 0
/// because of the minimum-periods floor.
#[derive(Debug, Clone)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub value: f64,
    pub macd: f64,
    pub signal_line: f64,
    pub bb_mid: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub rsi: Option<f64>,
    pub moving_average: f64,
    pub ma_ratio: f64,
}

impl IndicatorSnapshot {
    /// MACD line minus signal line; positive means bullish momentum.
    pub fn macd_diff(&self) -> f64 {
        self.macd - self.signal_line
    }
}

/// Rolling mean with a minimum-periods floor of 1: each output is the
/// mean of the last `window` values, or of however many exist so far.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        let n = (i + 1).min(window);
        out.push(sum / n as f64);
    }
    out
}

/// Enrich a validated series with the full indicator set.
///
/// Returns `InsufficientData` when the series is shorter than
/// `params.min_rows`, regardless of the individual window sizes.
pub fn enrich(
    code: &str,
    records: &[ValuationRecord],
    params: &IndicatorParams,
) -> Result<Vec<IndicatorSnapshot>, FundwatchError> {
    if records.len() < params.min_rows {
        return Err(FundwatchError::InsufficientData {
            code: code.to_string(),
            rows: records.len(),
            minimum: params.min_rows,
        });
    }

    let values: Vec<f64> = records.iter().map(|r| r.value).collect();

    let (macd_line, signal_line) = macd::macd_lines(
        &values,
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
    );
    let bands = bollinger::bands(&values, params.bollinger_window, params.bollinger_k);
    let rsi_values = rsi::rsi(&values, params.rsi_window);

    let (moving_average, ratio) = ma_ratio::ratio_with_ma(&values, params.ma_window);

    let snapshots = records
        .iter()
        .enumerate()
        .map(|(i, r)| IndicatorSnapshot {
            date: r.date,
            value: r.value,
            macd: macd_line[i],
            signal_line: signal_line[i],
            bb_mid: bands[i].mid,
            bb_upper: bands[i].upper,
            bb_lower: bands[i].lower,
            rsi: rsi_values[i],
            moving_average: moving_average[i],
            ma_ratio: ratio[i],
        })
        .collect();

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn records(values: &[f64]) -> Vec<ValuationRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ValuationRecord {
                date: start + chrono::Duration::days(i as i64),
                value: v,
            })
            .collect()
    }

    #[test]
    fn rolling_mean_partial_windows() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], 1.5);
        assert_relative_eq!(out[2], 2.0);
        assert_relative_eq!(out[3], 3.0);
    }

    #[test]
    fn enrich_rejects_short_series() {
        let recs = records(&[1.0; 10]);
        let err = enrich("000001", &recs, &IndicatorParams::default()).unwrap_err();
        match err {
            FundwatchError::InsufficientData { rows, minimum, .. } => {
                assert_eq!(rows, 10);
                assert_eq!(minimum, 26);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn enrich_produces_one_snapshot_per_row() {
        let values: Vec<f64> = (0..40).map(|i| 1.0 + 0.01 * i as f64).collect();
        let recs = records(&values);
        let snapshots = enrich("000001", &recs, &IndicatorParams::default()).unwrap();
        assert_eq!(snapshots.len(), 40);
    }

    #[test]
    fn enrich_ma_window_clips_to_length() {
        // 30 rows < default MA window of 50: the last row's MA must be
        // the mean of all 30 values.
        let values: Vec<f64> = (0..30).map(|i| 1.0 + 0.1 * i as f64).collect();
        let recs = records(&values);
        let snapshots = enrich("000001", &recs, &IndicatorParams::default()).unwrap();

        let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;
        assert_relative_eq!(snapshots[29].moving_average, mean, epsilon = 1e-12);
    }

    #[test]
    fn enrich_first_row_has_no_rsi() {
        let values: Vec<f64> = (0..30).map(|i| 1.0 + 0.01 * i as f64).collect();
        let recs = records(&values);
        let snapshots = enrich("000001", &recs, &IndicatorParams::default()).unwrap();
        assert!(snapshots[0].rsi.is_none());
    }

    #[test]
    fn enrich_flat_series_ratio_is_one() {
        let recs = records(&[2.0; 30]);
        let snapshots = enrich("000001", &recs, &IndicatorParams::default()).unwrap();
        for s in &snapshots {
            assert_relative_eq!(s.ma_ratio, 1.0);
            assert_relative_eq!(s.macd_diff(), 0.0);
        }
    }
}

//! Property tests for merge semantics, RSI bounds and incremental
//! sync correctness.

mod common;

use common::*;
use fundwatch::domain::indicator::rsi::rsi;
use fundwatch::domain::series::{merge, watermark, ValuationRecord};
use fundwatch::domain::sync::{PacingDelay, RetryPolicy, Synchronizer};
use proptest::prelude::*;

/// Canonical series: ascending consecutive dates, positive values.
fn series_strategy() -> impl Strategy<Value = Vec<ValuationRecord>> {
    prop::collection::vec(0.5f64..5.0, 1..120).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| rec(date(2024, 1, 1) + chrono::Duration::days(i as i64), v))
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_is_idempotent(series in series_strategy()) {
        prop_assert_eq!(merge(&series, &series), series);
    }

    #[test]
    fn merge_is_ascending_and_deduplicated(
        a in series_strategy(),
        b in series_strategy(),
    ) {
        let merged = merge(&a, &b);
        prop_assert!(merged.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn merge_prefers_new_rows(series in series_strategy(), bump in 0.1f64..1.0) {
        let updated: Vec<ValuationRecord> = series
            .iter()
            .map(|r| rec(r.date, r.value + bump))
            .collect();
        let merged = merge(&series, &updated);
        prop_assert_eq!(merged, updated);
    }

    #[test]
    fn merge_never_loses_dates(a in series_strategy(), b in series_strategy()) {
        let merged = merge(&a, &b);
        for r in a.iter().chain(b.iter()) {
            prop_assert!(merged.iter().any(|m| m.date == r.date));
        }
    }

    #[test]
    fn rsi_is_bounded(values in prop::collection::vec(0.5f64..5.0, 2..200)) {
        for r in rsi(&values, 14).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&r));
        }
    }

    #[test]
    fn incremental_sync_reconstructs_full_series(
        series in series_strategy(),
        split in 0usize..120,
        per in 1usize..40,
    ) {
        let split = split.min(series.len());
        let local = &series[..split];
        let source = MockQuoteSource::new().with_series("000001", &series, per);
        let sync = Synchronizer::new(&source, RetryPolicy::none(), PacingDelay::default());

        let fetched = sync.fetch_new("000001", watermark(local)).unwrap();
        let merged = merge(local, &fetched);
        prop_assert_eq!(merged, series);
    }

    #[test]
    fn full_history_fetch_is_complete(
        series in series_strategy(),
        per in 1usize..40,
    ) {
        let source = MockQuoteSource::new().with_series("000001", &series, per);
        let sync = Synchronizer::new(&source, RetryPolicy::none(), PacingDelay::default());
        let fetched = sync.fetch_new("000001", None).unwrap();
        prop_assert_eq!(fetched, series);
    }
}

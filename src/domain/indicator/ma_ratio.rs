//! Value-to-moving-average ratio.
//!
//! The window clips to the series length so that a short history still
//! produces a full-span mean; minimum-periods floor of 1 as everywhere.

use super::rolling_mean;

/// Rolling mean (window clipped to the series length) and the ratio of
/// each value to it, as parallel vectors aligned to the input.
pub fn ratio_with_ma(values: &[f64], window: usize) -> (Vec<f64>, Vec<f64>) {
    if values.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let window = window.min(values.len()).max(1);
    let ma = rolling_mean(values, window);
    let ratio = values.iter().zip(&ma).map(|(v, m)| v / m).collect();
    (ma, ratio)
}

//! Bollinger bands: rolling mean ± k · rolling population standard
//! deviation. Minimum-periods floor of 1, so early rows use partial
//! windows (the very first band collapses onto the value, σ = 0).

use super::rolling_mean;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBand {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Rolling bands over `window` samples with multiplier `k`.
pub fn bands(values: &[f64], window: usize, k: f64) -> Vec<BollingerBand> {
    let mid = rolling_mean(values, window);
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &values[start..=i];
        let m = mid[i];
        let variance =
            slice.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / slice.len() as f64;
        let std = variance.sqrt();
        out.push(BollingerBand {
            mid: m,
            upper: m + k * std,
            lower: m - k * std,
        });
    }
    out
}

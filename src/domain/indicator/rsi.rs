//! RSI from rolling-mean average gain and loss.
//!
//! Gains and losses come from day-over-day deltas (losses stored as
//! positive magnitudes) and are averaged over a rolling window with a
//! minimum-periods floor of 1. RSI = 100 − 100/(1+RS) with
//! RS = avg_gain/avg_loss. Where avg_loss is exactly zero RS is
//! undefined and the row yields `None`, never infinity. Row 0 has no
//! delta and is always `None`.

/// Rolling-mean RSI. Output is aligned to the input rows.
pub fn rsi(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);

    // Deltas indexed by row: delta for row i lives at i-1.
    let gains: Vec<f64> = values
        .windows(2)
        .map(|w| (w[1] - w[0]).max(0.0))
        .collect();
    let losses: Vec<f64> = values
        .windows(2)
        .map(|w| (w[0] - w[1]).max(0.0))
        .collect();

    for i in 1..values.len() {
        let end = i; // exclusive in delta space
        let start = end.saturating_sub(window);
        let n = (end - start) as f64;
        let avg_gain: f64 = gains[start..end].iter().sum::<f64>() / n;
        let avg_loss: f64 = losses[start..end].iter().sum::<f64>() / n;

        if avg_loss == 0.0 {
            out.push(None);
        } else {
            let rs = avg_gain / avg_loss;
            out.push(Some(100.0 - 100.0 / (1.0 + rs)));
        }
    }
    out
}

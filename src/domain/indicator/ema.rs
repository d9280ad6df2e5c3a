//! Exponential moving average.
//!
//! α = 2/(span+1), seeded by the first observation with no further
//! adjustment, so the output is defined for every row. Early values
//! carry the seed's bias; that is accepted at series start.

/// Exponentially weighted mean over a span.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    if values.is_empty() || span == 0 {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);
    for &v in &values[1..] {
        ema = alpha * v + (1.0 - alpha) * ema;
        out.push(ema);
    }
    out
}

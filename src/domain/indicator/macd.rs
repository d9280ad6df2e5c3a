//! MACD: fast EMA minus slow EMA, with a signal line that is an EMA of
//! the MACD line itself. Defaults 12/26/9.

use super::ema::ewm_mean;

/// Compute the MACD line and its signal line.
///
/// Both outputs are defined for every row because the underlying EMAs
/// are seeded by the first observation.
pub fn macd_lines(values: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    if values.is_empty() || fast == 0 || slow == 0 || signal == 0 {
        return (Vec::new(), Vec::new());
    }

    let ema_fast = ewm_mean(values, fast);
    let ema_slow = ewm_mean(values, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ewm_mean(&macd_line, signal);

    (macd_line, signal_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_input() {
        let (m, s) = macd_lines(&[], 12, 26, 9);
        assert!(m.is_empty());
        assert!(s.is_empty());
    }

    #[test]
    fn zero_span_rejected() {
        assert!(macd_lines(&[1.0, 2.0], 0, 26, 9).0.is_empty());
        assert!(macd_lines(&[1.0, 2.0], 12, 0, 9).0.is_empty());
        assert!(macd_lines(&[1.0, 2.0], 12, 26, 0).0.is_empty());
    }

    #[test]
    fn first_row_is_zero() {
        // Both EMAs seed on the same first observation.
        let (m, s) = macd_lines(&[1.5, 1.6, 1.7], 12, 26, 9);
        assert_relative_eq!(m[0], 0.0);
        assert_relative_eq!(s[0], 0.0);
    }

    #[test]
    fn constant_series_stays_zero() {
        let (m, s) = macd_lines(&[2.0; 50], 12, 26, 9);
        for i in 0..50 {
            assert_relative_eq!(m[i], 0.0);
            assert_relative_eq!(s[i], 0.0);
        }
    }

    #[test]
    fn uptrend_turns_macd_positive() {
        let values: Vec<f64> = (0..60).map(|i| 1.0 + 0.02 * i as f64).collect();
        let (m, s) = macd_lines(&values, 12, 26, 9);
        assert!(m[59] > 0.0);
        // In a steady uptrend MACD leads its own signal line.
        assert!(m[59] > s[59]);
    }

    #[test]
    fn downtrend_turns_macd_negative() {
        let values: Vec<f64> = (0..60).map(|i| 10.0 - 0.05 * i as f64).collect();
        let (m, _) = macd_lines(&values, 12, 26, 9);
        assert!(m[59] < 0.0);
    }

    #[test]
    fn matches_manual_ema_difference() {
        let values: Vec<f64> = (0..30).map(|i| (i as f64 * 0.7).sin() + 5.0).collect();
        let (m, _) = macd_lines(&values, 5, 10, 3);
        let fast = ewm_mean(&values, 5);
        let slow = ewm_mean(&values, 10);
        for i in 0..30 {
            assert_relative_eq!(m[i], fast[i] - slow[i], epsilon = 1e-12);
        }
    }
}

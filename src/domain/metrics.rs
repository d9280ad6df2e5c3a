//! Backtest performance metrics.

use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

/// Summary statistics for one completed backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub cumulative_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    /// `None` when fewer than two daily returns exist or their
    /// variance is zero.
    pub sharpe_ratio: Option<f64>,
    pub win_rate: f64,
    pub trade_count: usize,
}

/// Compound per-trade returns into a cumulative return.
pub fn cumulative_return(trade_returns: &[f64]) -> f64 {
    trade_returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Annualize a cumulative return over a calendar span.
pub fn cagr(cumulative: f64, start: NaiveDate, end: NaiveDate) -> f64 {
    let days = (end - start).num_days();
    if days <= 0 || cumulative <= -1.0 {
        return 0.0;
    }
    (1.0 + cumulative).powf(DAYS_PER_YEAR / days as f64) - 1.0
}

/// Worst peak-to-trough decline of an equity curve, as a negative
/// fraction (0.0 for a curve that never falls below a prior peak).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for &e in equity {
        peak = peak.max(e);
        if peak > 0.0 {
            worst = worst.min(e / peak - 1.0);
        }
    }
    worst
}

/// Annualized Sharpe ratio over daily returns.
pub fn sharpe_ratio(daily_returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    if daily_returns.len() < 2 {
        return None;
    }
    let n = daily_returns.len() as f64;
    let rf_daily = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let mean = daily_returns.iter().sum::<f64>() / n;
    let variance = daily_returns
        .iter()
        .map(|r| (r - mean) * (r - mean))
        .sum::<f64>()
        / (n - 1.0);
    if variance == 0.0 {
        return None;
    }
    Some((mean - rf_daily) / variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Fraction of trades with a strictly positive return.
pub fn win_rate(trade_returns: &[f64]) -> f64 {
    if trade_returns.is_empty() {
        return 0.0;
    }
    let wins = trade_returns.iter().filter(|r| **r > 0.0).count();
    wins as f64 / trade_returns.len() as f64
}

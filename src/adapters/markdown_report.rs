//! Markdown rendering of batch results.

use crate::domain::backtest::BacktestOutcome;
use crate::domain::error::FundwatchError;
use crate::domain::monitor::{InstrumentOutcome, MonitorReport};
use crate::domain::portfolio::Recommendation;
use crate::domain::signal;
use crate::ports::report_port::ReportPort;
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

pub struct MarkdownReport {
    signal_path: PathBuf,
    backtest_path: PathBuf,
}

impl MarkdownReport {
    pub fn new(signal_path: PathBuf, backtest_path: PathBuf) -> Self {
        Self {
            signal_path,
            backtest_path,
        }
    }

    fn write_file(path: &PathBuf, content: &str) -> Result<(), FundwatchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

impl ReportPort for MarkdownReport {
    fn write_signal_report(&self, report: &MonitorReport) -> Result<(), FundwatchError> {
        Self::write_file(&self.signal_path, &render_signal_report(report))
    }

    fn write_backtest_report(&self, outcomes: &[InstrumentOutcome]) -> Result<(), FundwatchError> {
        Self::write_file(&self.backtest_path, &render_backtest_report(outcomes))
    }

    fn write_recommendations(&self, picks: &[Recommendation]) -> Result<(), FundwatchError> {
        print!("{}", render_recommendations(picks));
        Ok(())
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn fmt_pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

/// Signal table ordered by action priority, then advice priority, then
/// RSI ascending with undefined RSI last.
pub fn render_signal_report(report: &MonitorReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Fund signals — {}\n", report.generated_on);

    if let Some(index) = &report.index {
        let _ = writeln!(out, "## Benchmark index {}\n", index.code);
        match &index.snapshot {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "- value {:.4}, RSI {}, MA ratio {:.3}, MACD diff {:.4}, band {}",
                    s.value,
                    fmt_opt(s.rsi),
                    s.ma_ratio,
                    s.macd_diff(),
                    signal::bollinger_position(s),
                );
                let _ = writeln!(
                    out,
                    "- advice {}, action {}\n",
                    index.signal.advice, index.signal.action
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "- unavailable: {}\n",
                    index.error.as_deref().unwrap_or("no data")
                );
            }
        }
    }

    let mut rows: Vec<&InstrumentOutcome> = report.instruments.iter().collect();
    rows.sort_by(|a, b| signal_order(a, b));

    let _ = writeln!(out, "## Signals\n");
    let _ = writeln!(
        out,
        "| code | date | value | RSI | MA ratio | MACD diff | band | advice | action |"
    );
    let _ = writeln!(out, "| --- | --- | --- | --- | --- | --- | --- | --- | --- |");
    for o in &rows {
        match &o.snapshot {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:.4} | {} | {:.3} | {:.4} | {} | {} | {} |",
                    o.code,
                    s.date,
                    s.value,
                    fmt_opt(s.rsi),
                    s.ma_ratio,
                    s.macd_diff(),
                    signal::bollinger_position(s),
                    o.signal.advice,
                    o.signal.action,
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "| {} | - | - | - | - | - | - | {} | {} |",
                    o.code, o.signal.advice, o.signal.action
                );
            }
        }
    }

    let noisy: Vec<&&InstrumentOutcome> = rows
        .iter()
        .filter(|o| o.error.is_some() || !o.warnings.is_empty())
        .collect();
    if !noisy.is_empty() {
        let _ = writeln!(out, "\n## Notes\n");
        for o in noisy {
            if let Some(e) = &o.error {
                let _ = writeln!(out, "- {}: {}", o.code, e);
            }
            for w in &o.warnings {
                let _ = writeln!(out, "- {}: {}", o.code, w);
            }
        }
    }

    out
}

fn signal_order(a: &InstrumentOutcome, b: &InstrumentOutcome) -> Ordering {
    a.signal
        .action
        .priority()
        .cmp(&b.signal.action.priority())
        .then(a.signal.advice.priority().cmp(&b.signal.advice.priority()))
        .then_with(|| {
            let ra = a.snapshot.as_ref().and_then(|s| s.rsi).unwrap_or(f64::MAX);
            let rb = b.snapshot.as_ref().and_then(|s| s.rsi).unwrap_or(f64::MAX);
            ra.total_cmp(&rb)
        })
        .then_with(|| a.code.cmp(&b.code))
}

/// Leaderboard ordered by cumulative return, unavailable runs last.
pub fn render_backtest_report(outcomes: &[InstrumentOutcome]) -> String {
    let mut completed: Vec<(&InstrumentOutcome, &crate::domain::backtest::BacktestReport)> =
        Vec::new();
    let mut unavailable: Vec<(&str, &str)> = Vec::new();

    for o in outcomes {
        match &o.backtest {
            Some(BacktestOutcome::Completed(r)) => completed.push((o, r)),
            Some(BacktestOutcome::Unavailable(reason)) => {
                unavailable.push((o.code.as_str(), reason.as_str()))
            }
            None => unavailable.push((
                o.code.as_str(),
                o.error.as_deref().unwrap_or("not analyzed"),
            )),
        }
    }
    completed.sort_by(|a, b| {
        b.1.result
            .cumulative_return
            .total_cmp(&a.1.result.cumulative_return)
            .then_with(|| a.0.code.cmp(&b.0.code))
    });

    let mut out = String::new();
    let _ = writeln!(out, "# Backtest leaderboard\n");
    let _ = writeln!(
        out,
        "| code | cum. return | CAGR | max drawdown | Sharpe | win rate | trades |"
    );
    let _ = writeln!(out, "| --- | --- | --- | --- | --- | --- | --- |");
    for (o, r) in &completed {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            o.code,
            fmt_pct(r.result.cumulative_return),
            fmt_pct(r.result.cagr),
            fmt_pct(r.result.max_drawdown),
            fmt_opt(r.result.sharpe_ratio),
            fmt_pct(r.result.win_rate),
            r.result.trade_count,
        );
    }

    if !unavailable.is_empty() {
        let _ = writeln!(out, "\n## Not backtested\n");
        for (code, reason) in unavailable {
            let _ = writeln!(out, "- {code}: {reason}");
        }
    }

    out
}

pub fn render_recommendations(picks: &[Recommendation]) -> String {
    let mut out = String::new();
    if picks.is_empty() {
        let _ = writeln!(out, "No buy candidates today.");
        return out;
    }
    let _ = writeln!(out, "Top picks:");
    for (i, p) in picks.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} — {} (score {}, RSI {}) allocate {:.2}",
            i + 1,
            p.candidate.code,
            p.candidate.action,
            p.candidate.score,
            fmt_opt(p.candidate.rsi),
            p.allocation,
        );
    }
    out
}

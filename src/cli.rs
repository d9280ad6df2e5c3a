//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_store::CsvStore;
use crate::adapters::eastmoney::EastmoneyClient;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markdown_report::MarkdownReport;
use crate::adapters::report_scan;
use crate::domain::backtest::{self, BacktestConfig, BacktestOutcome, StrategyVariant};
use crate::domain::error::FundwatchError;
use crate::domain::indicator::{self, IndicatorParams};
use crate::domain::monitor::{
    expected_latest_date, InstrumentOutcome, Monitor, MonitorConfig, MonitorSettings,
};
use crate::domain::portfolio::{self, PortfolioConfig};
use crate::domain::series;
use crate::domain::signal::{self, Signal};
use crate::domain::sync::{PacingDelay, RetryPolicy};
use crate::domain::validate::ValidationConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::series_store::SeriesStore;

#[derive(Parser, Debug)]
#[command(name = "fundwatch", about = "Fund valuation monitor and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sync, classify, backtest and report on all instruments
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Synchronize local data only
    Sync {
        #[arg(short, long)]
        config: PathBuf,
        /// Restrict to a single instrument code
        #[arg(long)]
        code: Option<String>,
    },
    /// Backtest from local data only
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
    /// Print top buy picks from local data
    Recommend {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config } => run_full(&config),
        Command::Sync { config, code } => run_sync(&config, code.as_deref()),
        Command::Backtest { config, code } => run_backtest(&config, code.as_deref()),
        Command::Recommend { config } => run_recommend(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Paths and reporting targets from `[monitor]`.
pub struct Paths {
    pub data_dir: PathBuf,
    pub signal_report: PathBuf,
    pub backtest_report: PathBuf,
}

pub fn build_paths(adapter: &dyn ConfigPort) -> Result<Paths, FundwatchError> {
    Ok(Paths {
        data_dir: PathBuf::from(adapter.get_string_or("monitor", "data_dir", "data")?),
        signal_report: PathBuf::from(adapter.get_string_or(
            "monitor",
            "signal_report",
            "signal_report.md",
        )?),
        backtest_report: PathBuf::from(adapter.get_string_or(
            "monitor",
            "backtest_report",
            "backtest_report.md",
        )?),
    })
}

pub fn build_settings(adapter: &dyn ConfigPort) -> Result<MonitorSettings, FundwatchError> {
    let monitor_defaults = MonitorConfig::default();
    let monitor = MonitorConfig {
        index_code: adapter.get_string_or("monitor", "index_code", &monitor_defaults.index_code)?,
        classify_window: adapter.get_usize_or(
            "monitor",
            "classify_window",
            monitor_defaults.classify_window,
        )?,
        update_hour: adapter.get_usize_or(
            "monitor",
            "update_hour",
            monitor_defaults.update_hour as usize,
        )? as u32,
        max_instruments: adapter.get_usize_or(
            "monitor",
            "max_instruments",
            monitor_defaults.max_instruments,
        )?,
        workers: adapter.get_usize_or("monitor", "workers", monitor_defaults.workers)?,
    };

    let retry = RetryPolicy {
        max_attempts: adapter.get_usize_or("sync", "retry_attempts", 5)?,
        delay: Duration::from_secs(adapter.get_usize_or("sync", "retry_delay_secs", 10)? as u64),
    };
    let pacing = PacingDelay {
        min_ms: adapter.get_usize_or("sync", "pacing_min_ms", 500)? as u64,
        max_ms: adapter.get_usize_or("sync", "pacing_max_ms", 2_000)? as u64,
    };

    Ok(MonitorSettings {
        monitor,
        validation: ValidationConfig::default(),
        indicators: IndicatorParams::default(),
        backtest: build_backtest_config(adapter)?,
        retry,
        pacing,
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, FundwatchError> {
    let defaults = BacktestConfig::default();
    let strategy_name = adapter.get_string_or("backtest", "strategy", "crossover")?;
    let strategy = StrategyVariant::parse(&strategy_name).ok_or_else(|| {
        FundwatchError::ConfigInvalid {
            section: "backtest".into(),
            key: "strategy".into(),
            reason: format!("unknown strategy {strategy_name:?} (crossover or ladder)"),
        }
    })?;

    Ok(BacktestConfig {
        stop_loss_pct: adapter.get_float_or("backtest", "stop_loss_pct", defaults.stop_loss_pct)?,
        min_rows: adapter.get_usize_or("backtest", "min_rows", defaults.min_rows)?,
        risk_free_rate: adapter.get_float_or(
            "backtest",
            "risk_free_rate",
            defaults.risk_free_rate,
        )?,
        strategy,
        entry_rsi: adapter.get_float_or("backtest", "entry_rsi", defaults.entry_rsi)?,
        entry_ma_ratio: adapter.get_float_or(
            "backtest",
            "entry_ma_ratio",
            defaults.entry_ma_ratio,
        )?,
        exit_rsi: adapter.get_float_or("backtest", "exit_rsi", defaults.exit_rsi)?,
        exit_ma_ratio: adapter.get_float_or("backtest", "exit_ma_ratio", defaults.exit_ma_ratio)?,
    })
}

pub fn build_portfolio_config(adapter: &dyn ConfigPort) -> Result<PortfolioConfig, FundwatchError> {
    let defaults = PortfolioConfig::default();
    Ok(PortfolioConfig {
        max_positions: adapter.get_usize_or("portfolio", "max_positions", defaults.max_positions)?,
        budget: adapter.get_float_or("portfolio", "budget", defaults.budget)?,
    })
}

fn build_source(adapter: &dyn ConfigPort) -> Result<EastmoneyClient, FundwatchError> {
    let page_size = adapter.get_usize_or("sync", "page_size", 49)?;
    let timeout = Duration::from_secs(adapter.get_usize_or("sync", "timeout_secs", 30)? as u64);
    EastmoneyClient::new(page_size, timeout)
}

/// Instrument codes, from `[monitor] codes` when set, otherwise by
/// scanning the previous signal report.
pub fn resolve_codes(
    adapter: &dyn ConfigPort,
    paths: &Paths,
    max_codes: usize,
) -> Result<Vec<String>, FundwatchError> {
    if adapter.has("monitor", "codes") {
        let raw = adapter.get_string("monitor", "codes")?;
        let codes: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .take(max_codes)
            .collect();
        return Ok(codes);
    }
    report_scan::scan_report_file(&paths.signal_report, max_codes)
}

fn run_full(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (paths, settings, portfolio_cfg) = match (
        build_paths(&adapter),
        build_settings(&adapter),
        build_portfolio_config(&adapter),
    ) {
        (Ok(p), Ok(s), Ok(f)) => (p, s, f),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let codes = match resolve_codes(&adapter, &paths, settings.monitor.max_instruments) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if codes.is_empty() {
        eprintln!("error: no instrument codes configured and no previous report to scan");
        return ExitCode::from(2);
    }

    let source = match build_source(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let store = CsvStore::new(paths.data_dir.clone());
    let reporter = MarkdownReport::new(paths.signal_report.clone(), paths.backtest_report.clone());

    eprintln!("Monitoring {} instruments...", codes.len());
    let monitor = Monitor::new(&store, &source, settings);
    let report = monitor.run_batch(&codes, Local::now().naive_local());

    for o in &report.instruments {
        for w in &o.warnings {
            eprintln!("warning: {}: {}", o.code, w);
        }
        if let Some(e) = &o.error {
            eprintln!("warning: {} unavailable ({})", o.code, e);
        }
    }

    if let Err(e) = reporter.write_signal_report(&report) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Signal report written to {}", paths.signal_report.display());

    if let Err(e) = reporter.write_backtest_report(&report.instruments) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!(
        "Backtest report written to {}",
        paths.backtest_report.display()
    );

    let picks = portfolio::recommend(collect_candidates(&report.instruments), &portfolio_cfg);
    if let Err(e) = reporter.write_recommendations(&picks) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    ExitCode::SUCCESS
}

fn collect_candidates(outcomes: &[InstrumentOutcome]) -> Vec<portfolio::BuyCandidate> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.snapshot
                .as_ref()
                .and_then(|s| portfolio::candidate(&o.code, s, &o.signal))
        })
        .collect()
}

fn run_sync(config_path: &PathBuf, code: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (paths, settings) = match (build_paths(&adapter), build_settings(&adapter)) {
        (Ok(p), Ok(s)) => (p, s),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let codes = match code {
        Some(c) => vec![c.to_string()],
        None => match resolve_codes(&adapter, &paths, settings.monitor.max_instruments) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };
    if codes.is_empty() {
        eprintln!("error: no instrument codes configured");
        return ExitCode::from(2);
    }

    let source = match build_source(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let store = CsvStore::new(paths.data_dir.clone());
    let expected = expected_latest_date(
        Local::now().naive_local(),
        settings.monitor.update_hour,
    );
    let monitor = Monitor::new(&store, &source, settings);

    let mut failed = false;
    for c in &codes {
        match monitor.sync_instrument(c, expected) {
            Ok((records, warnings)) => {
                for w in warnings {
                    eprintln!("warning: {c}: {w}");
                }
                eprintln!("{c}: {} rows", records.len());
            }
            Err(e) => {
                eprintln!("error: {c}: {e}");
                failed = true;
            }
        }
    }
    if failed {
        ExitCode::from(4)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_backtest(config_path: &PathBuf, code: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (paths, settings) = match (build_paths(&adapter), build_settings(&adapter)) {
        (Ok(p), Ok(s)) => (p, s),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let codes = match code {
        Some(c) => vec![c.to_string()],
        None => match resolve_codes(&adapter, &paths, settings.monitor.max_instruments) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };
    if codes.is_empty() {
        eprintln!("error: no instrument codes configured");
        return ExitCode::from(2);
    }

    let store = CsvStore::new(paths.data_dir.clone());
    let mut outcomes = Vec::with_capacity(codes.len());
    for c in &codes {
        outcomes.push(backtest_outcome_from_store(&store, c, &settings));
    }

    let reporter = MarkdownReport::new(paths.signal_report.clone(), paths.backtest_report.clone());
    if let Err(e) = reporter.write_backtest_report(&outcomes) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!(
        "Backtest report written to {}",
        paths.backtest_report.display()
    );
    ExitCode::SUCCESS
}

/// Local-data-only pipeline for the `backtest` and `recommend`
/// subcommands.
fn backtest_outcome_from_store(
    store: &dyn SeriesStore,
    code: &str,
    settings: &MonitorSettings,
) -> InstrumentOutcome {
    let unavailable = |error: String| InstrumentOutcome {
        code: code.to_string(),
        snapshot: None,
        signal: Signal::unavailable(),
        backtest: None,
        warnings: Vec::new(),
        error: Some(error),
    };

    let records = match store.load(code) {
        Ok(r) => r,
        Err(e) => return unavailable(e.to_string()),
    };
    if records.is_empty() {
        return unavailable("no local data".to_string());
    }

    let window = series::tail(&records, settings.monitor.classify_window);
    let (snapshot, sig) = match indicator::enrich(code, window, &settings.indicators) {
        Ok(snapshots) => match snapshots.last() {
            Some(latest) => (Some(latest.clone()), signal::classify(latest)),
            None => (None, Signal::unavailable()),
        },
        Err(_) => (None, Signal::unavailable()),
    };

    let bt: Option<BacktestOutcome> =
        backtest::run_backtest(code, &records, &settings.indicators, &settings.backtest).ok();

    InstrumentOutcome {
        code: code.to_string(),
        snapshot,
        signal: sig,
        backtest: bt,
        warnings: Vec::new(),
        error: None,
    }
}

fn run_recommend(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (paths, settings, portfolio_cfg) = match (
        build_paths(&adapter),
        build_settings(&adapter),
        build_portfolio_config(&adapter),
    ) {
        (Ok(p), Ok(s), Ok(f)) => (p, s, f),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let codes = match resolve_codes(&adapter, &paths, settings.monitor.max_instruments) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if codes.is_empty() {
        eprintln!("error: no instrument codes configured");
        return ExitCode::from(2);
    }

    let store = CsvStore::new(paths.data_dir.clone());
    let outcomes: Vec<InstrumentOutcome> = codes
        .iter()
        .map(|c| backtest_outcome_from_store(&store, c, &settings))
        .collect();

    let picks = portfolio::recommend(collect_candidates(&outcomes), &portfolio_cfg);
    let reporter = MarkdownReport::new(paths.signal_report.clone(), paths.backtest_report.clone());
    if let Err(e) = reporter.write_recommendations(&picks) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    ExitCode::SUCCESS
}

//! Reporting and export: JSON, CSV, and plain-text artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: indicator trace (for charting price, MACD, signal line and the
//!   buy/sell markers), trade list, equity curve and sweep table
//! - **Text**: the console summary and an indicator table
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use macdlab_core::{IndicatorRecord, StepRecord, Trade};

use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepResults;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-bar indicator trace.
///
/// Columns: date, close, ema_fast, ema_slow, macd, signal, histogram, buy, sell
pub fn export_indicators_csv(records: &[IndicatorRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "close",
        "ema_fast",
        "ema_slow",
        "macd",
        "signal",
        "histogram",
        "buy",
        "sell",
    ])?;
    for r in records {
        wtr.write_record([
            &r.date.to_string(),
            &format!("{:.4}", r.close),
            &format!("{:.6}", r.ema_fast),
            &format!("{:.6}", r.ema_slow),
            &format!("{:.6}", r.macd),
            &format!("{:.6}", r.signal),
            &format!("{:.6}", r.histogram),
            &r.buy_flag.to_string(),
            &r.sell_flag.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Export a trade list.
///
/// Columns: entry_date, entry_price, exit_date, exit_price, shares,
/// bars_held, return_pct, exit_reason
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "shares",
        "bars_held",
        "return_pct",
        "exit_reason",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.entry_date.to_string(),
            &format!("{:.4}", t.entry_price),
            &t.exit_date.to_string(),
            &format!("{:.4}", t.exit_price),
            &format!("{:.6}", t.shares),
            &t.bars_held().to_string(),
            &format!("{:.4}", t.return_pct() * 100.0),
            &format!("{:?}", t.exit_reason),
        ])?;
    }
    finish(wtr)
}

/// Export the balance/position trajectory.
///
/// Columns: date, close, action, balance, shares, equity
pub fn export_equity_csv(steps: &[StepRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "close", "action", "balance", "shares", "equity"])?;
    for s in steps {
        wtr.write_record([
            &s.date.to_string(),
            &format!("{:.4}", s.close),
            &format!("{:?}", s.action),
            &format!("{:.2}", s.balance),
            &format!("{:.6}", s.shares),
            &format!("{:.2}", s.equity),
        ])?;
    }
    finish(wtr)
}

/// Export a ranked sweep table.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "short_window",
        "long_window",
        "signal_window",
        "final_balance",
        "strategy_return_pct",
        "max_drawdown_pct",
        "trades",
    ])?;
    for (rank, e) in results.entries.iter().enumerate() {
        wtr.write_record([
            &(rank + 1).to_string(),
            &e.params.short_window.to_string(),
            &e.params.long_window.to_string(),
            &e.params.signal_window.to_string(),
            &format!("{:.2}", e.final_balance),
            &format!("{:.4}", e.strategy_return * 100.0),
            &format!("{:.4}", e.max_drawdown * 100.0),
            &e.trade_count.to_string(),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{symbol}_{run_id prefix}/` under `output_dir` containing:
/// - `result.json`: the full `BacktestResult`
/// - `indicators.csv`: per-bar MACD trace with buy/sell flags
/// - `trades.csv`: completed round trips
/// - `equity.csv`: bar-by-bar balance/position trajectory
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix = result.run_id.get(..12).unwrap_or(&result.run_id);
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("indicators.csv"),
        export_indicators_csv(&result.records)?,
    )?;
    std::fs::write(
        run_dir.join("trades.csv"),
        export_trades_csv(&result.simulation.trades)?,
    )?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&result.simulation.steps)?,
    )?;

    tracing::info!(dir = %run_dir.display(), "saved artifacts");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Text reports ───────────────────────────────────────────────────

/// Console summary of a single run.
pub fn format_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut out = String::with_capacity(512);
    let _ = writeln!(
        out,
        "{} | {} to {} | {} bars",
        result.symbol, result.start_date, result.end_date, result.bar_count
    );
    let _ = writeln!(
        out,
        "MACD({}, {}, {})",
        result.config.indicator.short_window,
        result.config.indicator.long_window,
        result.config.indicator.signal_window
    );
    let _ = writeln!(out, "Initial balance:      {:>14.2}", m.initial_balance);
    let _ = writeln!(out, "Final balance:        {:>14.2}", m.final_balance);
    let _ = writeln!(
        out,
        "Buy and hold return:  {:>14}",
        percent(m.buy_and_hold_return)
    );
    let _ = writeln!(
        out,
        "MACD strategy return: {:>13.2}%",
        m.strategy_return * 100.0
    );
    let _ = writeln!(out, "Excess return:        {:>14}", percent(m.excess_return()));
    let _ = writeln!(out, "Max drawdown:         {:>13.2}%", m.max_drawdown * 100.0);
    let _ = writeln!(
        out,
        "Trades:               {:>14} ({} winning, {:.0}% exposure)",
        m.trade_count,
        m.winning_trades,
        m.exposure * 100.0
    );
    out
}

/// Fixed-width table of the indicator trace, one row per bar.
pub fn format_indicator_table(records: &[IndicatorRecord]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    let _ = writeln!(
        out,
        "{:<10} {:>12} {:>12} {:>12} {:>10} {:>10}  flag",
        "date", "close", "ema_fast", "ema_slow", "macd", "signal"
    );
    for r in records {
        let flag = if r.buy_flag {
            "BUY"
        } else if r.sell_flag {
            "SELL"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:<10} {:>12.2} {:>12.4} {:>12.4} {:>10.4} {:>10.4}  {}",
            r.date, r.close, r.ema_fast, r.ema_slow, r.macd, r.signal, flag
        );
    }
    out
}

/// Top entries of a sweep as a fixed-width table.
pub fn format_sweep_table(results: &SweepResults, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>6} {:>5} {:>7} {:>14} {:>9} {:>9} {:>7}",
        "rank", "short", "long", "signal", "final", "return%", "maxdd%", "trades"
    );
    for (i, e) in results.top(top).iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4} {:>6} {:>5} {:>7} {:>14.2} {:>9.2} {:>9.2} {:>7}",
            i + 1,
            e.params.short_window,
            e.params.long_window,
            e.params.signal_window,
            e.final_balance,
            e.strategy_return * 100.0,
            e.max_drawdown * 100.0,
            e.trade_count
        );
    }
    let _ = writeln!(
        out,
        "buy and hold: {}",
        percent(results.buy_and_hold_return)
    );
    out
}

fn percent(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.2}%", r * 100.0),
        None => "n/a".to_string(),
    }
}

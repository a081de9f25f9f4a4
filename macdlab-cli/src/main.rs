//! MACDLab CLI: run and sweep commands.
//!
//! Commands:
//! - `run`: backtest the MACD crossover strategy on a quote CSV
//! - `sweep`: rank MACD window combinations on a quote CSV

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use macdlab_runner::{
    export_sweep_csv, format_indicator_table, format_summary, format_sweep_table, load_csv,
    run_backtest_from_file, run_sweep, save_artifacts, BacktestConfig, ParamGrid,
};

#[derive(Parser)]
#[command(
    name = "macdlab",
    about = "MACDLab CLI: MACD crossover backtesting on daily quotes"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the crossover strategy on one quote file.
    Run {
        /// Quote CSV (date and close columns required).
        #[arg(long)]
        input: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fast EMA span (overrides config).
        #[arg(long)]
        short: Option<usize>,

        /// Slow EMA span (overrides config).
        #[arg(long)]
        long: Option<usize>,

        /// Signal line EMA span (overrides config).
        #[arg(long)]
        signal: Option<usize>,

        /// Starting cash (overrides config).
        #[arg(long)]
        initial_balance: Option<f64>,

        /// Label for reports. Defaults to the input file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Directory for result JSON and CSV artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the per-bar indicator table.
        #[arg(long, default_value_t = false)]
        print_table: bool,
    },
    /// Rank MACD window combinations by final balance.
    Sweep {
        /// Quote CSV (date and close columns required).
        #[arg(long)]
        input: PathBuf,

        /// Fast spans to try, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = [8usize, 10, 12, 14])]
        short: Vec<usize>,

        /// Slow spans to try, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = [21usize, 26, 30])]
        long: Vec<usize>,

        /// Signal spans to try, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = [7usize, 9, 11])]
        signal: Vec<usize>,

        /// Starting cash.
        #[arg(long, default_value_t = macdlab_core::DEFAULT_INITIAL_BALANCE)]
        initial_balance: f64,

        /// Number of rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Write the full ranking as CSV.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            config,
            short,
            long,
            signal,
            initial_balance,
            symbol,
            output_dir,
            print_table,
        } => {
            let mut cfg = match config {
                Some(path) => BacktestConfig::from_file(&path)?,
                None => BacktestConfig::default(),
            };
            apply_overrides(&mut cfg, short, long, signal, initial_balance, symbol);
            run_cmd(&cfg, input, output_dir, print_table)
        }
        Commands::Sweep {
            input,
            short,
            long,
            signal,
            initial_balance,
            top,
            output,
        } => sweep_cmd(
            input,
            ParamGrid::new(short, long, signal),
            initial_balance,
            top,
            output,
        ),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_overrides(
    cfg: &mut BacktestConfig,
    short: Option<usize>,
    long: Option<usize>,
    signal: Option<usize>,
    initial_balance: Option<f64>,
    symbol: Option<String>,
) {
    if let Some(v) = short {
        cfg.indicator.short_window = v;
    }
    if let Some(v) = long {
        cfg.indicator.long_window = v;
    }
    if let Some(v) = signal {
        cfg.indicator.signal_window = v;
    }
    if let Some(v) = initial_balance {
        cfg.backtest.initial_balance = v;
    }
    if symbol.is_some() {
        cfg.backtest.symbol = symbol;
    }
}

fn run_cmd(
    cfg: &BacktestConfig,
    input: PathBuf,
    output_dir: Option<PathBuf>,
    print_table: bool,
) -> Result<()> {
    tracing::debug!(config = ?cfg, input = %input.display(), "resolved run config");
    let result = run_backtest_from_file(cfg, &input)
        .with_context(|| format!("backtest failed for {}", input.display()))?;

    if print_table {
        print!("{}", format_indicator_table(&result.records));
        println!();
    }
    print!("{}", format_summary(&result));

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        println!("Artifacts: {}", run_dir.display());
    }
    Ok(())
}

fn sweep_cmd(
    input: PathBuf,
    grid: ParamGrid,
    initial_balance: f64,
    top: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    if grid.size() == 0 {
        bail!("no valid window combinations (need positive windows with short < long)");
    }
    let bars = load_csv(&input).with_context(|| format!("failed to load {}", input.display()))?;
    let results = run_sweep(&bars, &grid, initial_balance)?;

    print!("{}", format_sweep_table(&results, top));

    if let Some(path) = output {
        std::fs::write(&path, export_sweep_csv(&results)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Ranking: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_override_config() {
        let cli = Cli::parse_from([
            "macdlab",
            "run",
            "--input",
            "q.csv",
            "--short",
            "5",
            "--initial-balance",
            "2500",
        ]);
        let Commands::Run {
            short,
            long,
            initial_balance,
            symbol,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        let mut cfg = BacktestConfig::default();
        apply_overrides(&mut cfg, short, long, None, initial_balance, symbol);
        assert_eq!(cfg.indicator.short_window, 5);
        assert_eq!(cfg.indicator.long_window, 26);
        assert_eq!(cfg.backtest.initial_balance, 2500.0);
    }

    #[test]
    fn sweep_lists_parse_comma_separated() {
        let cli = Cli::parse_from([
            "macdlab", "-v", "sweep", "--input", "q.csv", "--short", "3,4", "--long", "10",
        ]);
        assert_eq!(cli.verbose, 1);
        let Commands::Sweep {
            short,
            long,
            signal,
            ..
        } = cli.command
        else {
            panic!("expected sweep");
        };
        assert_eq!(short, vec![3, 4]);
        assert_eq!(long, vec![10]);
        assert_eq!(signal, vec![7, 9, 11]);
    }
}

//! End-to-end scenarios: bars → indicators → simulation.

use chrono::NaiveDate;
use macdlab_core::{
    compute_indicators, run_backtest, simulate, Action, BarSeries, CoreError, MacdParams,
    DEFAULT_INITIAL_BALANCE,
};

fn series(closes: &[f64]) -> BarSeries {
    BarSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), closes).unwrap()
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "actual={actual}, expected={expected}"
    );
}

#[test]
fn constant_prices_never_trade() {
    let bars = series(&[100.0; 40]);
    let bt = run_backtest(&bars, &MacdParams::default(), DEFAULT_INITIAL_BALANCE).unwrap();

    for r in &bt.records {
        approx(r.macd, 0.0);
        approx(r.signal, 0.0);
        assert!(!r.buy_flag && !r.sell_flag);
    }
    assert!(bt.simulation.trades.is_empty());
    assert_eq!(bt.simulation.final_balance, DEFAULT_INITIAL_BALANCE);
    assert_eq!(bt.simulation.strategy_return, 0.0);
}

#[test]
fn step_up_triggers_single_buy_at_the_step() {
    let mut closes = vec![10.0; 30];
    closes.extend([20.0; 30]);
    let bars = series(&closes);
    let bt = run_backtest(&bars, &MacdParams::default(), DEFAULT_INITIAL_BALANCE).unwrap();

    let buys: Vec<usize> = bt
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.buy_flag)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(buys, vec![30]);

    let steps = &bt.simulation.steps;
    assert_eq!(steps[29].action, Action::Hold);
    assert_eq!(steps[29].shares, 0.0);
    assert_eq!(steps[30].action, Action::Buy);
    assert_eq!(steps[30].balance, 0.0);
    approx(steps[30].shares, DEFAULT_INITIAL_BALANCE / 20.0);

    // Entered and exited at 20, so the cash is unchanged.
    approx(bt.simulation.final_balance, DEFAULT_INITIAL_BALANCE);
    approx(bt.simulation.buy_and_hold_return.unwrap(), 1.0);
}

#[test]
fn entry_before_the_jump_doubles_the_balance() {
    // The uptick to 11 fires the buy; the plateau at 22 doubles the entry price.
    let mut closes = vec![10.0; 30];
    closes.push(11.0);
    closes.extend([22.0; 30]);
    let bars = series(&closes);
    let bt = run_backtest(&bars, &MacdParams::default(), DEFAULT_INITIAL_BALANCE).unwrap();

    assert_eq!(bt.records.iter().filter(|r| r.buy_flag).count(), 1);
    assert!(bt.records[30].buy_flag);
    assert_eq!(bt.simulation.trades.len(), 1);
    approx(bt.simulation.final_balance, 2.0 * DEFAULT_INITIAL_BALANCE);
    approx(bt.simulation.strategy_return, 1.0);
}

#[test]
fn series_ending_invested_is_liquidated_to_cash() {
    let mut closes = vec![10.0; 30];
    closes.push(11.0);
    closes.extend([22.0; 3]);
    let bars = series(&closes);
    let bt = run_backtest(&bars, &MacdParams::default(), DEFAULT_INITIAL_BALANCE).unwrap();

    assert!(bt.records.iter().all(|r| !r.sell_flag));
    let last_step = bt.simulation.steps.last().unwrap();
    assert!(last_step.shares > 0.0, "still invested before liquidation");

    let liq = bt.simulation.liquidation.as_ref().unwrap();
    assert_eq!(liq.action, Action::Liquidate);
    assert_eq!(liq.shares, 0.0);
    assert_eq!(liq.balance, bt.simulation.final_balance);
    approx(bt.simulation.final_balance, 2.0 * DEFAULT_INITIAL_BALANCE);
}

#[test]
fn non_positive_initial_balance_is_invalid() {
    let bars = series(&[10.0, 11.0, 12.0]);
    for balance in [0.0, -5.0] {
        let err = run_backtest(&bars, &MacdParams::default(), balance).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)), "{balance}");
    }
}

#[test]
fn empty_series_is_invalid_for_both_stages() {
    let err = compute_indicators(&[], &MacdParams::default()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));

    let err = simulate(&[], DEFAULT_INITIAL_BALANCE).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[test]
fn single_bar_series_has_no_flags() {
    let bars = series(&[42.0]);
    let bt = run_backtest(&bars, &MacdParams::default(), 1_000.0).unwrap();
    assert_eq!(bt.records.len(), 1);
    assert!(!bt.records[0].buy_flag && !bt.records[0].sell_flag);
    assert_eq!(bt.simulation.final_balance, 1_000.0);
    assert_eq!(bt.simulation.buy_and_hold_return, Some(0.0));
}

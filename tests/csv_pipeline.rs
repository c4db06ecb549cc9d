mod common;

use approx::assert_relative_eq;
use common::{flat_series, ohlc_series, v_shape};
use pozole::prelude::*;
use std::io::Write;

#[test]
fn saved_series_reloads_and_backtests_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v.csv");

    let original = ohlc_series("V", &v_shape());
    save_csv(&original, &path).unwrap();
    let reloaded = load_csv(&path, "V").unwrap();
    assert_eq!(reloaded.len(), original.len());

    let params = StrategyParams::SmaCrossover(SmaCrossoverParams::default());
    let run = |series: PriceSeries| {
        let engine = BacktestEngine::new(BacktestConfig::default(), series).unwrap();
        engine.run(build_strategy(&params, 10).as_mut()).unwrap()
    };

    let a = run(original);
    let b = run(reloaded);
    assert_eq!(a.orders.len(), b.orders.len());
    assert_relative_eq!(a.final_value, b.final_value, epsilon = 1e-6);
}

#[test]
fn csv_with_bad_row_names_the_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    writeln!(file, "2023-01-03,10,11,9,10.5,100").unwrap();
    writeln!(file, "2023-01-04,10,9,11,10.5,100").unwrap();

    let err = load_csv(file.path(), "BAD").unwrap_err();
    match err {
        BacktestError::Data(msg) => assert!(msg.contains("line 3"), "{}", msg),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn date_range_filter_is_inclusive() {
    let series = flat_series("D", &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let from = common::start_date() + chrono::Duration::days(1);
    let to = common::start_date() + chrono::Duration::days(3);

    let window = series.between(from, to).unwrap();
    assert_eq!(window.len(), 3);
    assert_eq!(window.first().close, 2.0);
    assert_eq!(window.last().close, 4.0);
}

#[test]
fn configuration_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut config = BacktestConfiguration::default();
    config.cash = 25_000.0;
    config.strategies.momentum_v2.risk_per_trade = 0.01;
    config.analyzers = vec![AnalyzerKind::SharpeRatio, AnalyzerKind::DrawDown];
    config.to_json_file(&path).unwrap();

    let loaded = BacktestConfiguration::from_json_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(BacktestConfig::from(&loaded).initial_cash, 25_000.0);
}

#[test]
fn invalid_config_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "cash": -5.0 }}"#).unwrap();

    let err = BacktestConfiguration::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, BacktestError::Configuration(_)));
}

#[test]
fn report_lists_requested_analyzers() {
    let engine = BacktestEngine::new(BacktestConfig::default(), flat_series("V", &v_shape())).unwrap();
    let params = StrategyParams::SmaCrossover(SmaCrossoverParams::default());
    let result = engine.run(build_strategy(&params, 10).as_mut()).unwrap();

    let report = result.analysis.report(&AnalyzerKind::ALL);
    let names: Vec<_> = report.keys().copied().collect();
    assert_eq!(names, vec!["Returns", "DrawDown", "SharpeRatio", "TradeAnalyzer"]);
    assert_eq!(report["TradeAnalyzer"]["total_open"], 1.0);
    assert_relative_eq!(report["Returns"]["total_return"], result.pnl, epsilon = 1e-9);
}

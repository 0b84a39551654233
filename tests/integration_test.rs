//! Integration tests for the backtest engine.
//!
//! Tests cover:
//! - Threshold entry with take-profit exit, end to end
//! - Crossover signals and re-entry
//! - Open positions at the end of the series are dropped
//! - Summary arithmetic over a known ledger
//! - Batch isolation and parallel/sequential parity with a mock data port
//! - Missing indicator columns and empty series

mod common;

use approx::assert_relative_eq;
use common::*;
use serde_json::json;
use stratbench::domain::backtest::{
    run_batch, run_item, run_strategy, BacktestRequest, BatchOptions,
};
use stratbench::domain::error::StratbenchError;
use stratbench::domain::metrics::{summarize, Summary};
use stratbench::domain::pipeline::{compute, compute_for_strategy};
use stratbench::domain::position::{PositionKind, Trade};
use stratbench::domain::rule_eval::evaluate;
use stratbench::domain::strategy::StrategySpec;

fn spec(value: serde_json::Value) -> StrategySpec {
    StrategySpec::from_value(&value).unwrap()
}

mod scenarios {
    use super::*;

    #[test]
    fn threshold_entry_take_profit_exit() {
        let bars = series_from_closes(&[9.0, 11.0, 13.0, 8.0]);
        let run = run_strategy(&bars, &spec(threshold_item("AAA", 10.0, 2.0))).unwrap();

        assert_eq!(run.signals.entry, vec![false, true, true, false]);
        assert_eq!(run.trades().len(), 1);
        let trade = &run.trades()[0];
        assert_eq!(trade.entry_index, 1);
        assert_eq!(trade.exit_index, 2);
        assert_relative_eq!(trade.entry_price, 11.0);
        assert_relative_eq!(trade.exit_price, 13.0);
        assert_relative_eq!(trade.shares, 100.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(trade.pnl, 18.1818, epsilon = 1e-4);
        assert_relative_eq!(trade.pct_return, 18.1818, epsilon = 1e-4);
        assert!(!run.simulation.annotations[3].in_position);
    }

    #[test]
    fn crossover_fires_on_each_upward_cross() {
        let bars = series_from_closes(&[10.0, 9.0, 11.0, 8.0, 12.0]);
        let strategy = spec(json!({
            "symbol": "XYZ",
            "investment": 100,
            "entry_rules": [{"indicator": "close", "operator": "crossesAbove", "value": 10}],
            "exit_conditions": [{"type": "indicator", "indicator_rule":
                {"indicator": "close", "operator": "crossesBelow", "value": 10}}]
        }));
        let run = run_strategy(&bars, &strategy).unwrap();

        assert_eq!(run.signals.entry, vec![false, false, true, false, true]);
        assert_eq!(run.signals.exit, vec![false, true, false, true, false]);
        // in at 2, out at 3, back in at 4 and still open
        assert_eq!(run.trades().len(), 1);
        assert_eq!(run.trades()[0].entry_index, 2);
        assert_eq!(run.trades()[0].exit_index, 3);
        assert!(run.simulation.annotations[4].in_position);
    }

    #[test]
    fn position_opened_on_last_bar_is_dropped() {
        let bars = series_from_closes(&[5.0, 6.0, 7.0, 12.0]);
        let run = run_strategy(&bars, &spec(threshold_item("AAA", 10.0, 1.0))).unwrap();

        assert!(run.signals.entry_at(3));
        assert!(run.trades().is_empty());
        assert_eq!(run.summary, Summary::neutral(100.0));
    }

    #[test]
    fn summary_over_known_ledger() {
        let trade = |pnl: f64, pct_return: f64| Trade {
            entry_index: 0,
            exit_index: 1,
            entry_price: 1.0,
            exit_price: 1.0,
            shares: 1.0,
            pnl,
            pct_return,
            kind: PositionKind::Long,
        };
        let s = summarize(&[trade(10.0, 5.0), trade(-4.0, -2.0)], 100.0);

        assert_relative_eq!(s.total_profit, 6.0);
        assert_relative_eq!(s.end_capital, 106.0);
        assert_eq!(s.num_trades, 2);
        assert_relative_eq!(s.win_rate, 50.0);
        assert_relative_eq!(s.loss_rate, 50.0);
        assert_relative_eq!(s.avg_deal_profit, 3.0);
        assert_relative_eq!(s.avg_deal_profit_pct, 1.5);
        assert_relative_eq!(s.cumulative_return_pct, 6.0);
    }
}

mod indicator_strategies {
    use super::*;

    #[test]
    fn rsi_strategy_trades_on_oscillating_prices() {
        let bars = series_from_closes(&wave_closes(200, 100.0));
        let strategy = spec(rsi_item("OSC"));
        let run = run_strategy(&bars, &strategy).unwrap();

        assert!(run.frame.derived("RSI").is_some());
        assert!(!run.trades().is_empty());
        assert_eq!(run.summary.num_trades, run.trades().len());
        for pair in run.trades().windows(2) {
            assert!(pair[1].entry_index > pair[0].exit_index);
        }
        for trade in run.trades() {
            assert!(trade.exit_index > trade.entry_index);
        }
    }

    #[test]
    fn compare_to_moving_average_builds_suffixed_column() {
        let bars = series_from_closes(&wave_closes(80, 50.0));
        let strategy = spec(json!({
            "symbol": "MA",
            "investment": 500,
            "entry_rules": [{"indicator": "close", "operator": "crossesAbove",
                             "compare_to": "ema", "compare_period": 10}],
            "exit_conditions": [{"type": "indicator", "indicator_rule":
                {"indicator": "macd", "operator": "crossesBelow", "compareTo": "none", "value": 0}}]
        }));
        let run = run_strategy(&bars, &strategy).unwrap();

        assert!(run.frame.derived("EMA_10").is_some());
        assert!(run.frame.derived("MACD").is_some());
        assert!(run.signals.entry.iter().any(|&s| s));
    }

    #[test]
    fn unsupported_indicator_never_trades() {
        let bars = series_from_closes(&wave_closes(40, 20.0));
        let strategy = spec(json!({
            "symbol": "UNK",
            "investment": 100,
            "entry_rules": [{"indicator": "ichimoku", "operator": ">", "value": 1}],
            "exit_conditions": [{"type": "take_profit", "value": 1}]
        }));
        let run = run_strategy(&bars, &strategy).unwrap();
        assert!(run.signals.entry.iter().all(|&s| !s));
        assert!(run.trades().is_empty());
    }

    #[test]
    fn pipeline_is_idempotent_for_a_strategy() {
        let bars = series_from_closes(&wave_closes(60, 30.0));
        let strategy = spec(rsi_item("IDEM"));
        assert_eq!(
            compute_for_strategy(&bars, &strategy),
            compute_for_strategy(&bars, &strategy)
        );
    }
}

mod failure_modes {
    use super::*;

    #[test]
    fn evaluator_names_missing_column() {
        let bars = series_from_closes(&[1.0, 2.0, 3.0]);
        let strategy = spec(rsi_item("RAW"));
        let frame = compute(&bars, &[]);

        match evaluate(&frame, &strategy.entry_rules, &strategy.exit_conditions) {
            Err(StratbenchError::MissingIndicatorColumn { rule, column }) => {
                assert!(rule.contains("rsi"));
                assert_eq!(column, "RSI");
            }
            other => panic!("expected MissingIndicatorColumn, got {other:?}"),
        }
    }

    #[test]
    fn empty_series_yields_neutral_run() {
        let run = run_strategy(&BarSeries::empty(), &spec(rsi_item("EMPTY"))).unwrap();
        assert!(run.frame.is_empty());
        assert!(run.signals.entry.is_empty());
        assert!(run.simulation.annotations.is_empty());
        assert!(run.trades().is_empty());
        assert_eq!(run.summary, Summary::neutral(1000.0));
    }

    #[test]
    fn invalid_item_is_rejected_before_fetch() {
        let port = MockDataPort::new().with_error("NEG", "should not be fetched");
        let mut item = threshold_item("NEG", 10.0, 1.0);
        item["investment"] = json!(-100);

        let outcome = run_item(&port, &item);
        assert!(matches!(
            outcome.result,
            Err(StratbenchError::InvalidStrategy { .. })
        ));
    }
}

mod batch {
    use super::*;

    fn port() -> MockDataPort {
        MockDataPort::new()
            .with_closes("AAA", &[9.0, 11.0, 13.0, 8.0])
            .with_closes("OSC", &wave_closes(150, 100.0))
            .with_error("ERR", "disk on fire")
    }

    #[test]
    fn one_failure_does_not_affect_others() {
        let request = BacktestRequest {
            stocks: vec![
                threshold_item("AAA", 10.0, 2.0),
                threshold_item("ERR", 10.0, 2.0),
                json!("not an object"),
                threshold_item("NONE", 10.0, 2.0),
                rsi_item("OSC"),
            ],
        };
        let outcomes = run_batch(&port(), &request, &BatchOptions::default());

        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[0].symbol, "AAA");
        assert_eq!(outcomes[0].result.as_ref().unwrap().trades().len(), 1);
        assert!(matches!(outcomes[1].result, Err(StratbenchError::Data { .. })));
        assert!(matches!(
            outcomes[2].result,
            Err(StratbenchError::InvalidStrategy { .. })
        ));
        assert!(matches!(outcomes[3].result, Err(StratbenchError::NoData { .. })));
        assert!(outcomes[4].is_ok());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let request = BacktestRequest {
            stocks: (0..8)
                .map(|i| {
                    if i % 2 == 0 {
                        rsi_item("OSC")
                    } else {
                        threshold_item("AAA", 10.0 + i as f64 * 0.1, 1.0)
                    }
                })
                .collect(),
        };
        let sequential = run_batch(&port(), &request, &BatchOptions::sequential());
        let parallel = run_batch(
            &port(),
            &request,
            &BatchOptions {
                parallel: true,
                workers: 3,
            },
        );

        assert_eq!(sequential.len(), parallel.len());
        for (s, p) in sequential.iter().zip(&parallel) {
            assert_eq!(s.symbol, p.symbol);
            assert_eq!(s.result.as_ref().unwrap(), p.result.as_ref().unwrap());
        }
    }

    #[test]
    fn start_date_trims_history() {
        let mut item = threshold_item("AAA", 10.0, 2.0);
        item["since_ipo"] = json!(false);
        item["start_date"] = json!("2024-01-03");

        let outcome = run_item(&port(), &item);
        let run = outcome.result.unwrap();
        assert_eq!(run.frame.len(), 2);
        assert_eq!(run.frame.bars().bars()[0].datetime, day(2));
    }
}

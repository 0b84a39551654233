//! Trade simulator: a FLAT/LONG state machine walked once over the bars.
//!
//! Per bar, in order:
//! 1. LONG and not the entry bar: open pnl against take-profit, stop-loss
//!    and the indicator exit signal; any one closes at this bar's close.
//! 2. FLAT (and no exit on this bar): an entry signal opens a position with
//!    `investment / close` shares.
//!
//! A position still open after the last bar is dropped, not liquidated.

use crate::domain::ohlcv::BarSeries;
use crate::domain::position::{Position, Trade};
use crate::domain::rule_eval::Signals;
use serde::Serialize;
use tracing::debug;

/// Absolute open-pnl thresholds. `stop_loss` is a positive loss amount.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExitThresholds {
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl ExitThresholds {
    fn hit(&self, pnl: f64) -> bool {
        self.take_profit.is_some_and(|tp| pnl >= tp)
            || self.stop_loss.is_some_and(|sl| pnl <= -sl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionMark {
    Buy,
    Sell,
}

impl PositionMark {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionMark::Buy => "BUY",
            PositionMark::Sell => "SELL",
        }
    }
}

/// Diagnostic per-bar state. `pnl` is the open pnl while holding.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarAnnotation {
    pub in_position: bool,
    pub position: Option<PositionMark>,
    pub pnl: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationResult {
    pub annotations: Vec<BarAnnotation>,
    pub trades: Vec<Trade>,
}

pub fn simulate(
    bars: &BarSeries,
    signals: &Signals,
    thresholds: ExitThresholds,
    investment: f64,
) -> SimulationResult {
    let mut annotations = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();
    let mut open: Option<Position> = None;

    for (i, bar) in bars.bars().iter().enumerate() {
        let close = bar.close;

        if let Some(position) = open.take() {
            let Some(price) = close else {
                annotations.push(BarAnnotation {
                    in_position: true,
                    position: Some(PositionMark::Buy),
                    pnl: None,
                });
                open = Some(position);
                continue;
            };

            let pnl = position.unrealized_pnl(price);
            if signals.exit_at(i) || thresholds.hit(pnl) {
                let trade = position.close(i, price);
                debug!(
                    entry = trade.entry_index,
                    exit = trade.exit_index,
                    pnl = trade.pnl,
                    "position closed"
                );
                trades.push(trade);
                annotations.push(BarAnnotation {
                    in_position: false,
                    position: Some(PositionMark::Sell),
                    pnl: Some(pnl),
                });
            } else {
                annotations.push(BarAnnotation {
                    in_position: true,
                    position: Some(PositionMark::Buy),
                    pnl: Some(pnl),
                });
                open = Some(position);
            }
            continue;
        }

        match close {
            Some(price) if signals.entry_at(i) && price > 0.0 => {
                debug!(index = i, price, "position opened");
                open = Some(Position::open(i, price, investment));
                annotations.push(BarAnnotation {
                    in_position: true,
                    position: Some(PositionMark::Buy),
                    pnl: Some(0.0),
                });
            }
            _ => annotations.push(BarAnnotation::default()),
        }
    }

    if let Some(position) = open {
        debug!(
            entry = position.entry_index,
            "position still open at end of series; dropped"
        );
    }

    SimulationResult {
        annotations,
        trades,
    }
}

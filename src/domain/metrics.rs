//! Trade ledger summary.

use super::position::Trade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub start_capital: f64,
    pub end_capital: f64,
    pub total_profit: f64,
    pub num_trades: usize,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub avg_deal_profit: f64,
    pub avg_deal_profit_pct: f64,
    pub cumulative_return_pct: f64,
}

impl Summary {
    /// Empty ledger: capital unchanged, every rate zero.
    pub fn neutral(start_capital: f64) -> Self {
        Self {
            start_capital,
            end_capital: start_capital,
            total_profit: 0.0,
            num_trades: 0,
            win_rate: 0.0,
            loss_rate: 0.0,
            avg_deal_profit: 0.0,
            avg_deal_profit_pct: 0.0,
            cumulative_return_pct: 0.0,
        }
    }
}

/// A pnl of exactly zero counts as a loss.
pub fn summarize(trades: &[Trade], start_capital: f64) -> Summary {
    if trades.is_empty() {
        return Summary::neutral(start_capital);
    }

    let num_trades = trades.len();
    let count = num_trades as f64;
    let total_profit: f64 = trades.iter().map(|t| t.pnl).sum();
    let wins = trades.iter().filter(|t| t.is_win()).count();
    let losses = num_trades - wins;
    let pct_sum: f64 = trades.iter().map(|t| t.pct_return).sum();

    let cumulative_return_pct = if start_capital != 0.0 {
        total_profit / start_capital * 100.0
    } else {
        0.0
    };

    Summary {
        start_capital,
        end_capital: start_capital + total_profit,
        total_profit,
        num_trades,
        win_rate: wins as f64 / count * 100.0,
        loss_rate: losses as f64 / count * 100.0,
        avg_deal_profit: total_profit / count,
        avg_deal_profit_pct: pct_sum / count,
        cumulative_return_pct,
    }
}

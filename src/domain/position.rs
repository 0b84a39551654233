//! Open position and closed-trade ledger records.

use serde::{Deserialize, Serialize};

/// Long-only engine; serialized with the order side clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionKind {
    #[serde(rename = "BUY")]
    Long,
}

/// Lives only while the simulator is long. Shares and entry price never
/// change after entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: f64,
    pub entry_price: f64,
    pub entry_index: usize,
}

impl Position {
    /// Fractional shares, no rounding.
    pub fn open(entry_index: usize, price: f64, investment: f64) -> Self {
        Self {
            shares: investment / price,
            entry_price: price,
            entry_index,
        }
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.shares
    }

    pub fn close(self, exit_index: usize, exit_price: f64) -> Trade {
        let pnl = self.unrealized_pnl(exit_price);
        Trade {
            entry_index: self.entry_index,
            exit_index,
            entry_price: self.entry_price,
            exit_price,
            shares: self.shares,
            pnl,
            pct_return: pnl / (self.entry_price * self.shares) * 100.0,
            kind: PositionKind::Long,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    pub pnl: f64,
    pub pct_return: f64,
    #[serde(rename = "type")]
    pub kind: PositionKind,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

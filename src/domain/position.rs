//! Position risk snapshots read from the exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::PositionSide;

/// Risk view of one side of a symbol's position.
///
/// Fetched fresh for every decision and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRisk {
    pub symbol: String,
    pub position_side: PositionSide,
    /// Average entry price; zero when no position is open.
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    /// Margin allocated to this position in isolated mode.
    pub isolated_wallet: Decimal,
    /// Signed position size.
    pub position_amt: Decimal,
}

impl PositionRisk {
    /// An empty position snapshot.
    pub fn flat(symbol: impl Into<String>, position_side: PositionSide, mark_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            position_side,
            entry_price: Decimal::ZERO,
            mark_price,
            isolated_wallet: Decimal::ZERO,
            position_amt: Decimal::ZERO,
        }
    }

    /// Whether a position is currently open on this side.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.entry_price.is_zero()
    }
}

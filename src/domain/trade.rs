//! Account trade history and realized profit/loss.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fill from the account trade history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTrade {
    /// Exchange trade id, increasing per symbol.
    pub id: i64,
    pub symbol: String,
    pub realized_pnl: Decimal,
    /// Fee paid for the fill, always non-negative.
    pub commission: Decimal,
    pub time: DateTime<Utc>,
}

/// Realized profit/loss over a trade-history window.
///
/// Computed on demand and never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedPnl {
    /// Sum of positive realized PnL.
    pub profit: Decimal,
    /// Sum of negative realized PnL (zero or negative).
    pub loss: Decimal,
    pub commission: Decimal,
    /// `(profit - loss) - commission`.
    pub net_profit: Decimal,
    /// Trades that contributed to profit or loss.
    pub trades: usize,
}

impl RealizedPnl {
    /// Aggregate realized PnL from trades.
    ///
    /// Trades with zero realized PnL count toward neither profit nor loss, and
    /// their commission is only included when `include_zero_pnl_commission` is set.
    #[must_use]
    pub fn from_trades(trades: &[AccountTrade], include_zero_pnl_commission: bool) -> Self {
        let mut pnl = Self::default();

        for trade in trades {
            if trade.realized_pnl > Decimal::ZERO {
                pnl.profit += trade.realized_pnl;
                pnl.commission += trade.commission;
                pnl.trades += 1;
            } else if trade.realized_pnl < Decimal::ZERO {
                pnl.loss += trade.realized_pnl;
                pnl.commission += trade.commission;
                pnl.trades += 1;
            } else if include_zero_pnl_commission {
                pnl.commission += trade.commission;
            }
        }

        pnl.net_profit = (pnl.profit - pnl.loss) - pnl.commission;
        pnl
    }
}

impl fmt::Display for RealizedPnl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Profit: {:.4} USDT\nLoss: {:.4} USDT\nCommission: {:.4} USDT\nNet Profit: {:.4} USDT",
            self.profit, self.loss, self.commission, self.net_profit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal, commission: Decimal) -> AccountTrade {
        AccountTrade {
            id: 0,
            symbol: "BTCUSDT".into(),
            realized_pnl: pnl,
            commission,
            time: Utc::now(),
        }
    }

    fn sample() -> Vec<AccountTrade> {
        vec![
            trade(dec!(10), dec!(1)),
            trade(dec!(-4), dec!(1)),
            trade(dec!(6), dec!(1)),
            trade(dec!(0), dec!(1)),
        ]
    }

    #[test]
    fn test_from_trades_excludes_zero_pnl_commission() {
        let pnl = RealizedPnl::from_trades(&sample(), false);
        assert_eq!(pnl.profit, dec!(16));
        assert_eq!(pnl.loss, dec!(-4));
        assert_eq!(pnl.commission, dec!(3));
        assert_eq!(pnl.net_profit, dec!(17));
        assert_eq!(pnl.trades, 3);
    }

    #[test]
    fn test_from_trades_can_include_zero_pnl_commission() {
        let pnl = RealizedPnl::from_trades(&sample(), true);
        assert_eq!(pnl.commission, dec!(4));
        assert_eq!(pnl.net_profit, dec!(16));
        assert_eq!(pnl.trades, 3);
    }

    #[test]
    fn test_from_trades_empty() {
        assert_eq!(RealizedPnl::from_trades(&[], false), RealizedPnl::default());
    }

    #[test]
    fn test_display_summary() {
        let pnl = RealizedPnl::from_trades(&sample(), false);
        let text = pnl.to_string();
        assert!(text.contains("Profit: 16.0000 USDT"));
        assert!(text.contains("Net Profit: 17.0000 USDT"));
    }
}

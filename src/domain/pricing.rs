//! Quantity sizing and protective price arithmetic.
//!
//! All rounding is half-away-from-zero at the exchange-declared precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::command::Side;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Decimal places the exchange accepts for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPrecision {
    pub price_precision: u32,
    pub quantity_precision: u32,
}

impl SymbolPrecision {
    #[must_use]
    pub const fn new(price_precision: u32, quantity_precision: u32) -> Self {
        Self {
            price_precision,
            quantity_precision,
        }
    }
}

/// Round half-away-from-zero to `dp` decimal places.
#[must_use]
pub fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a USD notional into a leveraged order quantity.
///
/// `round(amount_usd / mark_price, quantity_precision) * leverage`. Returns zero
/// when the mark price is not positive.
#[must_use]
pub fn leveraged_quantity(
    amount_usd: u64,
    mark_price: Decimal,
    quantity_precision: u32,
    leverage: u32,
) -> Decimal {
    if mark_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let base = round_half_away(Decimal::from(amount_usd) / mark_price, quantity_precision);
    base * Decimal::from(leverage)
}

/// Return on equity in percent, signed by position side.
///
/// Long: `(mark - entry) / mark * 100`. Short: `(entry - mark) / entry * 100`.
/// `None` when the divisor is zero.
#[must_use]
pub fn return_on_equity(side: Side, entry_price: Decimal, mark_price: Decimal) -> Option<Decimal> {
    match side {
        Side::Long => (mark_price - entry_price)
            .checked_div(mark_price)
            .map(|ratio| ratio * HUNDRED),
        Side::Short => (entry_price - mark_price)
            .checked_div(entry_price)
            .map(|ratio| ratio * HUNDRED),
    }
}

/// Take-profit and stop-loss trigger prices for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectivePrices {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

/// Derives protective trigger prices from the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceCalculator {
    take_profit_pct: Decimal,
    stop_loss_pct: Decimal,
}

impl PriceCalculator {
    #[must_use]
    pub const fn new(take_profit_pct: Decimal, stop_loss_pct: Decimal) -> Self {
        Self {
            take_profit_pct,
            stop_loss_pct,
        }
    }

    /// Long: TP above entry, SL below. Short: the reverse.
    #[must_use]
    pub fn calculate(&self, side: Side, entry_price: Decimal, price_precision: u32) -> ProtectivePrices {
        let (take_profit, stop_loss) = match side {
            Side::Long => (
                entry_price * (HUNDRED + self.take_profit_pct) / HUNDRED,
                entry_price * (HUNDRED - self.stop_loss_pct) / HUNDRED,
            ),
            Side::Short => (
                entry_price * (HUNDRED - self.take_profit_pct) / HUNDRED,
                entry_price * (HUNDRED + self.stop_loss_pct) / HUNDRED,
            ),
        };
        ProtectivePrices {
            take_profit: round_half_away(take_profit, price_precision),
            stop_loss: round_half_away(stop_loss, price_precision),
        }
    }
}

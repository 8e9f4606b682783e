//! Converts a USD notional into an exchange-legal order quantity.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::leveraged_quantity;
use crate::exchange::FuturesExchange;

pub struct QuantitySizer {
    exchange: Arc<dyn FuturesExchange>,
    leverage: u32,
}

impl QuantitySizer {
    pub fn new(exchange: Arc<dyn FuturesExchange>, leverage: u32) -> Self {
        Self { exchange, leverage }
    }

    /// Leveraged quantity for `amount_usd` at the current mark price.
    ///
    /// Returns zero when the mark price cannot be fetched; callers must treat
    /// zero as "do not place an entry".
    pub async fn size(&self, symbol: &str, amount_usd: u64, quantity_precision: u32) -> Decimal {
        let mark_price = match self.exchange.mark_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!(symbol, error = %e, "Failed to fetch mark price");
                return Decimal::ZERO;
            }
        };

        let quantity = leveraged_quantity(amount_usd, mark_price, quantity_precision, self.leverage);
        debug!(
            symbol,
            amount_usd,
            mark_price = %mark_price,
            leverage = self.leverage,
            quantity = %quantity,
            "Sized order"
        );
        quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MockExchange;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_size_applies_precision_then_leverage() {
        let exchange = Arc::new(MockExchange::new());
        exchange.set_mark_price("BTCUSDT", dec!(20000));
        let sizer = QuantitySizer::new(exchange, 5);

        assert_eq!(sizer.size("BTCUSDT", 1000, 3).await, dec!(0.25));
    }

    #[tokio::test]
    async fn test_size_is_zero_when_price_unavailable() {
        let exchange = Arc::new(MockExchange::new());
        exchange.fail_on("mark_price");
        let sizer = QuantitySizer::new(exchange, 5);

        assert_eq!(sizer.size("BTCUSDT", 1000, 3).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_size_rounds_small_notional_to_zero() {
        let exchange = Arc::new(MockExchange::new());
        exchange.set_mark_price("BTCUSDT", dec!(60000));
        let sizer = QuantitySizer::new(exchange, 20);

        assert_eq!(sizer.size("BTCUSDT", 10, 3).await, Decimal::ZERO);
    }
}

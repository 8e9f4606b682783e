//! Position risk guard.
//!
//! Before adding to a position the guard reads the current position risk and
//! refuses entries whose return on equity has fallen below the configured
//! threshold. Only positions whose isolated margin exceeds the margin limit
//! are scrutinized; smaller positions always pass.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::app::TradingConfig;
use crate::domain::{return_on_equity, Command, PositionRisk, Side};
use crate::error::{ExchangeError, RiskError};
use crate::exchange::FuturesExchange;

/// Result of a risk check.
#[derive(Debug, Clone)]
pub enum RiskCheckResult {
    /// Trade is allowed to proceed.
    Approved,
    /// Trade is rejected with reason.
    Rejected(RiskError),
}

impl RiskCheckResult {
    /// Check if approved.
    pub fn is_approved(&self) -> bool {
        matches!(self, RiskCheckResult::Approved)
    }

    /// Get rejection error if rejected.
    pub fn rejection_error(&self) -> Option<&RiskError> {
        match self {
            RiskCheckResult::Rejected(e) => Some(e),
            RiskCheckResult::Approved => None,
        }
    }
}

/// Evaluates whether a new or larger entry is permitted for a position.
pub struct PositionRiskEvaluator {
    exchange: Arc<dyn FuturesExchange>,
    limit_margin_size: Decimal,
    threshold: Decimal,
}

impl PositionRiskEvaluator {
    /// Create an evaluator with an explicit margin limit and ROE threshold (percent).
    pub fn new(
        exchange: Arc<dyn FuturesExchange>,
        limit_margin_size: Decimal,
        threshold: Decimal,
    ) -> Self {
        Self {
            exchange,
            limit_margin_size,
            threshold,
        }
    }

    pub fn from_config(exchange: Arc<dyn FuturesExchange>, config: &TradingConfig) -> Self {
        Self::new(exchange, config.limit_margin_size, config.win_or_loss_ratio)
    }

    /// Fetch the risk snapshot for one side of a symbol.
    ///
    /// Returns `ExchangeError::PositionNotFound` when the exchange reports no
    /// entry for that position side.
    pub async fn fetch_risk(&self, symbol: &str, side: Side) -> Result<PositionRisk, ExchangeError> {
        let position_side = side.position_side();
        self.exchange
            .position_risk(symbol)
            .await?
            .into_iter()
            .find(|risk| risk.position_side == position_side)
            .ok_or_else(|| ExchangeError::PositionNotFound {
                symbol: symbol.to_string(),
                side,
            })
    }

    /// Compare the position's ROE against the threshold.
    pub fn check_ratio(&self, command: &Command, risk: &PositionRisk) -> RiskCheckResult {
        if !risk.is_open() {
            return RiskCheckResult::Approved;
        }

        let Some(roe) = return_on_equity(command.side, risk.entry_price, risk.mark_price) else {
            return RiskCheckResult::Rejected(RiskError::InvalidMarkPrice {
                side: command.side,
                entry_price: risk.entry_price,
            });
        };

        if roe >= self.threshold {
            debug!(symbol = %command.symbol, roe = %roe.round_dp(2), "ROE above threshold");
            return RiskCheckResult::Approved;
        }

        RiskCheckResult::Rejected(RiskError::RatioBreached {
            side: command.side,
            entry_price: risk.entry_price,
            mark_price: risk.mark_price,
            roe: roe.round_dp(2),
            threshold: self.threshold,
        })
    }

    /// Fetch risk and apply the margin gate and ratio guard.
    ///
    /// A missing position counts as no position and is approved. Transport
    /// failures are returned to the caller.
    pub async fn evaluate(&self, command: &Command) -> Result<RiskCheckResult, ExchangeError> {
        let risk = match self.fetch_risk(&command.symbol, command.side).await {
            Ok(risk) => risk,
            Err(ExchangeError::PositionNotFound { .. }) => {
                debug!(symbol = %command.symbol, side = %command.side, "No position reported");
                return Ok(RiskCheckResult::Approved);
            }
            Err(e) => return Err(e),
        };

        if risk.isolated_wallet <= self.limit_margin_size {
            return Ok(RiskCheckResult::Approved);
        }

        info!(
            symbol = %command.symbol,
            side = %command.side,
            isolated_wallet = %risk.isolated_wallet,
            limit = %self.limit_margin_size,
            "Margin above limit, checking ROE"
        );

        let result = self.check_ratio(command, &risk);
        if let Some(e) = result.rejection_error() {
            warn!(symbol = %command.symbol, error = %e, "Risk guard rejected entry");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionSide;
    use crate::testkit::MockExchange;
    use rust_decimal_macros::dec;

    fn risk(entry: Decimal, mark: Decimal, wallet: Decimal) -> PositionRisk {
        PositionRisk {
            symbol: "BTCUSDT".into(),
            position_side: PositionSide::Long,
            entry_price: entry,
            mark_price: mark,
            isolated_wallet: wallet,
            position_amt: dec!(1),
        }
    }

    fn evaluator(exchange: Arc<MockExchange>, limit: Decimal, threshold: Decimal) -> PositionRiskEvaluator {
        PositionRiskEvaluator::new(exchange, limit, threshold)
    }

    #[test]
    fn test_zero_entry_always_allowed() {
        let eval = evaluator(Arc::new(MockExchange::new()), dec!(0), dec!(50));
        let command = Command::new("BTCUSDT", Side::Long, 100);
        assert!(eval.check_ratio(&command, &risk(dec!(0), dec!(90), dec!(0))).is_approved());
    }

    #[test]
    fn test_long_losing_position_rejected() {
        let eval = evaluator(Arc::new(MockExchange::new()), dec!(0), dec!(0));
        let command = Command::new("BTCUSDT", Side::Long, 100);
        let result = eval.check_ratio(&command, &risk(dec!(100), dec!(90), dec!(10)));
        match result.rejection_error() {
            Some(RiskError::RatioBreached { roe, .. }) => assert_eq!(*roe, dec!(-11.11)),
            other => panic!("expected ratio breach, got {other:?}"),
        }
    }

    #[test]
    fn test_short_winning_position_allowed() {
        let eval = evaluator(Arc::new(MockExchange::new()), dec!(0), dec!(0));
        let command = Command::new("BTCUSDT", Side::Short, 100);
        assert!(eval.check_ratio(&command, &risk(dec!(100), dec!(90), dec!(10))).is_approved());
    }

    #[test]
    fn test_long_zero_mark_rejected() {
        let eval = evaluator(Arc::new(MockExchange::new()), dec!(0), dec!(0));
        let command = Command::new("BTCUSDT", Side::Long, 100);
        let result = eval.check_ratio(&command, &risk(dec!(100), dec!(0), dec!(10)));
        assert!(matches!(
            result.rejection_error(),
            Some(RiskError::InvalidMarkPrice { .. })
        ));
    }

    #[tokio::test]
    async fn test_small_wallet_bypasses_guard() {
        let exchange = Arc::new(MockExchange::new());
        exchange.set_position(risk(dec!(100), dec!(90), dec!(5)));
        let eval = evaluator(exchange, dec!(10), dec!(0));
        let command = Command::new("BTCUSDT", Side::Long, 100);
        assert!(eval.evaluate(&command).await.unwrap().is_approved());
    }

    #[tokio::test]
    async fn test_large_wallet_is_checked() {
        let exchange = Arc::new(MockExchange::new());
        exchange.set_position(risk(dec!(100), dec!(90), dec!(50)));
        let eval = evaluator(exchange, dec!(10), dec!(0));
        let command = Command::new("BTCUSDT", Side::Long, 100);
        assert!(!eval.evaluate(&command).await.unwrap().is_approved());
    }

    #[tokio::test]
    async fn test_missing_position_is_approved() {
        let eval = evaluator(Arc::new(MockExchange::new()), dec!(0), dec!(0));
        let command = Command::new("BTCUSDT", Side::Short, 100);
        assert!(eval.evaluate(&command).await.unwrap().is_approved());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_returned() {
        let exchange = Arc::new(MockExchange::new());
        exchange.fail_on("position_risk");
        let eval = evaluator(exchange, dec!(0), dec!(0));
        let command = Command::new("BTCUSDT", Side::Long, 100);
        assert!(eval.evaluate(&command).await.is_err());
    }
}

//! Inbound trading commands.
//!
//! Signals arrive as underscore-delimited strings:
//!
//! ```text
//! SYMBOL_SIDE_AMOUNTUSD[_TP[_SL[_CHECKWL[_ONLYONE]]]]
//! ```
//!
//! `SIDE` is `LONG` or `SHORT` (any case), `AMOUNTUSD` is a positive integer and
//! every flag is the literal `true` or `false`. Absent flags are `false`.
//!
//! ```
//! use tradebridge::domain::{Command, Side};
//!
//! let command: Command = "ETHUSDT_long_500_true_false".parse().unwrap();
//! assert_eq!(command.symbol, "ETHUSDT");
//! assert_eq!(command.side, Side::Long);
//! assert_eq!(command.amount_usd, 500);
//! assert!(command.take_profit);
//! assert!(!command.stop_loss);
//! assert!(!command.check_whitelist);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::order::{OrderSide, PositionSide};
use crate::error::CommandError;

const MAX_FIELDS: usize = 7;

/// Direction of the position a command opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Wire representation used by the exchange and in debounce keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }

    /// Order side that opens or increases a position on this side.
    #[must_use]
    pub const fn entry_order_side(self) -> OrderSide {
        match self {
            Side::Long => OrderSide::Buy,
            Side::Short => OrderSide::Sell,
        }
    }

    /// Order side that closes a position on this side.
    #[must_use]
    pub const fn exit_order_side(self) -> OrderSide {
        match self {
            Side::Long => OrderSide::Sell,
            Side::Short => OrderSide::Buy,
        }
    }

    /// Hedge-mode position side for this direction.
    #[must_use]
    pub const fn position_side(self) -> PositionSide {
        match self {
            Side::Long => PositionSide::Long,
            Side::Short => PositionSide::Short,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(Side::Long),
            "SHORT" => Ok(Side::Short),
            _ => Err(CommandError::InvalidSide(s.to_string())),
        }
    }
}

/// A validated trading command. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub symbol: String,
    pub side: Side,
    /// Notional size in USD before leverage.
    pub amount_usd: u64,
    /// Place a take-profit-market order after entry.
    pub take_profit: bool,
    /// Place a stop-market order after entry.
    pub stop_loss: bool,
    /// Reject the command unless the symbol is whitelisted.
    pub check_whitelist: bool,
    /// Skip the entry entirely when the symbol already has open orders.
    pub only_one_order: bool,
}

impl Command {
    /// Create a command with every optional flag cleared.
    pub fn new(symbol: impl Into<String>, side: Side, amount_usd: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            amount_usd,
            take_profit: false,
            stop_loss: false,
            check_whitelist: false,
            only_one_order: false,
        }
    }

    #[must_use]
    pub fn with_protection(mut self, take_profit: bool, stop_loss: bool) -> Self {
        self.take_profit = take_profit;
        self.stop_loss = stop_loss;
        self
    }

    #[must_use]
    pub fn with_whitelist_check(mut self, check: bool) -> Self {
        self.check_whitelist = check;
        self
    }

    #[must_use]
    pub fn with_only_one_order(mut self, only_one: bool) -> Self {
        self.only_one_order = only_one;
        self
    }

    /// Whether at least one protective order was requested.
    #[must_use]
    pub fn wants_protection(&self) -> bool {
        self.take_profit || self.stop_loss
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CommandError::Empty);
        }

        let fields: Vec<&str> = raw.split('_').map(str::trim).collect();
        if fields.len() > MAX_FIELDS {
            return Err(CommandError::TooManyFields {
                count: fields.len(),
            });
        }

        let symbol = required(&fields, 0, "symbol")?.to_ascii_uppercase();
        let side = required(&fields, 1, "side")?.parse::<Side>()?;
        let amount = required(&fields, 2, "amount")?;
        let amount_usd = match amount.parse::<u64>() {
            Ok(value) if value > 0 => value,
            _ => return Err(CommandError::InvalidAmount(amount.to_string())),
        };

        Ok(Self {
            symbol,
            side,
            amount_usd,
            take_profit: flag(&fields, 3, "take_profit")?,
            stop_loss: flag(&fields, 4, "stop_loss")?,
            check_whitelist: flag(&fields, 5, "check_whitelist")?,
            only_one_order: flag(&fields, 6, "only_one_order")?,
        })
    }
}

fn required<'a>(
    fields: &[&'a str],
    index: usize,
    field: &'static str,
) -> Result<&'a str, CommandError> {
    match fields.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(CommandError::MissingField { field }),
    }
}

fn flag(fields: &[&str], index: usize, field: &'static str) -> Result<bool, CommandError> {
    let Some(value) = fields.get(index) else {
        return Ok(false);
    };
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CommandError::InvalidFlag {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command() {
        let command: Command = "ETHUSDT_LONG_500_true_true_true".parse().unwrap();
        assert_eq!(command.symbol, "ETHUSDT");
        assert_eq!(command.side, Side::Long);
        assert_eq!(command.amount_usd, 500);
        assert!(command.take_profit);
        assert!(command.stop_loss);
        assert!(command.check_whitelist);
        assert!(!command.only_one_order);
    }

    #[test]
    fn test_parse_side_is_case_insensitive() {
        let command: Command = "btcusdt_Short_100".parse().unwrap();
        assert_eq!(command.symbol, "BTCUSDT");
        assert_eq!(command.side, Side::Short);
        assert!(!command.wants_protection());
    }

    #[test]
    fn test_parse_only_one_order_flag() {
        let command: Command = "BTCUSDT_SHORT_100_false_true_false_true".parse().unwrap();
        assert!(!command.take_profit);
        assert!(command.stop_loss);
        assert!(command.only_one_order);
    }

    #[test]
    fn test_parse_trims_body() {
        let command: Command = "  BTCUSDT_LONG_25_true_false\n".parse().unwrap();
        assert_eq!(command.amount_usd, 25);
        assert!(command.take_profit);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
    }

    #[test]
    fn test_parse_missing_fields() {
        assert_eq!(
            "BTCUSDT".parse::<Command>(),
            Err(CommandError::MissingField { field: "side" })
        );
        assert_eq!(
            "BTCUSDT_LONG".parse::<Command>(),
            Err(CommandError::MissingField { field: "amount" })
        );
        assert_eq!(
            "_LONG_100".parse::<Command>(),
            Err(CommandError::MissingField { field: "symbol" })
        );
    }

    #[test]
    fn test_parse_invalid_side() {
        assert_eq!(
            "BTCUSDT_BUY_100".parse::<Command>(),
            Err(CommandError::InvalidSide("BUY".into()))
        );
    }

    #[test]
    fn test_parse_invalid_amount() {
        assert_eq!(
            "BTCUSDT_LONG_abc".parse::<Command>(),
            Err(CommandError::InvalidAmount("abc".into()))
        );
        assert_eq!(
            "BTCUSDT_LONG_0".parse::<Command>(),
            Err(CommandError::InvalidAmount("0".into()))
        );
        assert_eq!(
            "BTCUSDT_LONG_12.5".parse::<Command>(),
            Err(CommandError::InvalidAmount("12.5".into()))
        );
    }

    #[test]
    fn test_parse_invalid_flag() {
        assert_eq!(
            "BTCUSDT_LONG_100_yes".parse::<Command>(),
            Err(CommandError::InvalidFlag {
                field: "take_profit",
                value: "yes".into()
            })
        );
    }

    #[test]
    fn test_parse_too_many_fields() {
        assert_eq!(
            "BTCUSDT_LONG_100_true_true_true_true_true".parse::<Command>(),
            Err(CommandError::TooManyFields { count: 8 })
        );
    }

    #[test]
    fn test_side_order_sides_are_mirrored() {
        assert_eq!(Side::Long.entry_order_side(), OrderSide::Buy);
        assert_eq!(Side::Long.exit_order_side(), OrderSide::Sell);
        assert_eq!(Side::Short.entry_order_side(), OrderSide::Sell);
        assert_eq!(Side::Short.exit_order_side(), OrderSide::Buy);
        assert_eq!(Side::Short.position_side(), PositionSide::Short);
    }
}

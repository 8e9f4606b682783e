//! Handler for the `parse` command.

use crate::cli::ParseArgs;
use crate::domain::Command;
use crate::error::Result;

/// Parse a command string and print its fields. Nothing is sent to the exchange.
pub fn execute(args: &ParseArgs) -> Result<()> {
    let command: Command = args.command.parse()?;

    println!("symbol:          {}", command.symbol);
    println!("side:            {}", command.side);
    println!("amount_usd:      {}", command.amount_usd);
    println!("take_profit:     {}", command.take_profit);
    println!("stop_loss:       {}", command.stop_loss);
    println!("check_whitelist: {}", command.check_whitelist);
    println!("only_one_order:  {}", command.only_one_order);
    Ok(())
}

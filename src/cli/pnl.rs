//! Handler for the `pnl` command.

use std::sync::Arc;
use std::time::Duration;

use crate::adapter::binance::BinanceFutures;
use crate::app::Config;
use crate::cli::PnlArgs;
use crate::error::Result;
use crate::service::{Clock, PnlAggregator, SystemClock};

/// Fetch and print realized PnL for the requested day.
pub async fn execute(args: &PnlArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    config.init_logging();

    let exchange = BinanceFutures::new(
        config.exchange.rest_url.clone(),
        config.require_credentials()?,
        config.exchange.recv_window_ms,
        Duration::from_secs(config.exchange.timeout_secs),
    )?;
    let pnl = PnlAggregator::new(
        Arc::new(exchange),
        config.pnl_symbols(),
        config.schedule.timezone()?,
    )
    .with_day_end(config.pnl.day_end()?)
    .with_zero_pnl_commission(config.pnl.include_zero_pnl_commission);

    let date = args
        .date
        .unwrap_or_else(|| pnl.local_date(SystemClock.now()));
    let result = pnl.daily_realized(date).await?;

    println!("Realized PnL for {date} ({})", pnl.timezone());
    println!("{result}");
    Ok(())
}

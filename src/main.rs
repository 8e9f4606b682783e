use clap::Parser;
use tradebridge::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run(args) => cli::run::execute(args).await?,
        Commands::Pnl(args) => cli::pnl::execute(args).await?,
        Commands::Parse(args) => cli::parse::execute(args)?,
    }
    Ok(())
}

use anyhow::Result;
use clap::Parser;

use pfdns::args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.globals.loglevel.filter())
        .format_timestamp(None)
        .format_target(false)
        .init();

    pfdns::run(cli).await
}

pub mod api;
pub mod args;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod dns;
pub mod reconcile;
#[cfg(test)]
mod test_support;
pub mod view;

use anyhow::Result;

use crate::api::PfSenseClient;
use crate::args::{Cli, Commands};
use crate::commands::leases::handle_leases;
use crate::commands::logs::handle_logs;
use crate::commands::overrides::handle_overrides;
use crate::commands::status::{handle_access_list, handle_status};
use crate::commands::CommandContext;
use crate::config::PfSenseConfig;
use crate::confirm::{AlwaysConfirm, Confirm, StdinConfirm};

/// Execute the CLI given a pre-parsed argument struct. Logging must already
/// be initialized.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = match &cli.globals.config {
        Some(path) => path.clone(),
        None => PfSenseConfig::default_path()?,
    };
    let config = PfSenseConfig::load(&config_path)?;
    let client = PfSenseClient::new(&config)?;
    let ctx = CommandContext::new(client, cli.globals.format.mode());

    let mut confirm: Box<dyn Confirm> = if cli.globals.yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(StdinConfirm)
    };

    match cli.command {
        Commands::Status { command } => handle_status(&ctx, command).await,
        Commands::Leases { command } => handle_leases(&ctx, confirm.as_mut(), command).await,
        Commands::Overrides { command } => handle_overrides(&ctx, confirm.as_mut(), command).await,
        Commands::Logs { command } => handle_logs(&ctx, command).await,
        Commands::AccessList => handle_access_list(&ctx).await,
        Commands::Resolve(args) => {
            let ips = dns::resolve(&args.hostname, args.nameserver.as_deref()).await?;
            for ip in ips {
                println!("{ip}");
            }
            Ok(())
        }
    }
}

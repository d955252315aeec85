use anyhow::Result;

use super::{print_value, CommandContext};
use crate::args::StatusCommands;

pub async fn handle_status(ctx: &CommandContext, command: StatusCommands) -> Result<()> {
    let data = match command {
        StatusCommands::System => ctx.client.system_status().await?,
        StatusCommands::Gateways => ctx.client.gateway_status().await?,
        StatusCommands::Interfaces => ctx.client.interface_status().await?,
        StatusCommands::Openvpn => ctx.client.openvpn_status().await?,
        StatusCommands::ApiVersion => ctx.client.api_version().await?,
    };
    print_value(ctx.mode, &data)
}

pub async fn handle_access_list(ctx: &CommandContext) -> Result<()> {
    let data = ctx.client.unbound_access_list().await?;
    print_value(ctx.mode, &data)
}

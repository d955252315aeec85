use anyhow::{bail, Result};
use log::info;

use super::{print_value, value_contains, CommandContext};
use crate::api::models::OverrideHandle;
use crate::api::UnboundApi;
use crate::args::{
    OutputMode, OverrideAddArgs, OverrideCommands, OverrideDeleteArgs, OverrideDeleteHostArgs,
    OverrideListArgs, OverrideSyncArgs,
};
use crate::confirm::Confirm;
use crate::dns;
use crate::reconcile::{Reconciler, SyncOutcome};
use crate::view::{override_rows, render_table, OVERRIDE_HEADERS};

pub async fn handle_overrides(
    ctx: &CommandContext,
    confirm: &mut dyn Confirm,
    command: OverrideCommands,
) -> Result<()> {
    let reconciler = Reconciler::new(&ctx.client);
    match command {
        OverrideCommands::List(args) => list_overrides(ctx, &reconciler, &args).await,
        OverrideCommands::Get { hostname } => {
            let handles = reconciler.find_by_hostname(&hostname).await?;
            print_handles(ctx.mode, &handles)
        }
        OverrideCommands::Add(args) => add_override(ctx, &reconciler, args).await,
        OverrideCommands::Delete(args) => {
            let deleted = delete_exact(&reconciler, &args, confirm).await?;
            info!("deleted {} override(s)", deleted);
            Ok(())
        }
        OverrideCommands::DeleteHost(args) => {
            let deleted = delete_host(&reconciler, &args, confirm).await?;
            info!("deleted {} override(s) for {}", deleted, args.hostname);
            Ok(())
        }
        OverrideCommands::Sync(args) => sync_override(&reconciler, args).await,
    }
}

async fn list_overrides<A: UnboundApi + Sync>(
    ctx: &CommandContext,
    reconciler: &Reconciler<'_, A>,
    args: &OverrideListArgs,
) -> Result<()> {
    let mut handles = reconciler.list_overrides().await?;
    if let Some(needle) = &args.find {
        handles.retain(|handle| {
            serde_json::to_value(&handle.record)
                .map(|value| value_contains(&value, needle))
                .unwrap_or(false)
        });
    }
    print_handles(ctx.mode, &handles)
}

fn print_handles(mode: OutputMode, handles: &[OverrideHandle]) -> Result<()> {
    if mode == OutputMode::Table {
        println!("{}", render_table(OVERRIDE_HEADERS, &override_rows(handles)));
        Ok(())
    } else {
        print_value(mode, &handles)
    }
}

async fn add_override<A: UnboundApi + Sync>(
    ctx: &CommandContext,
    reconciler: &Reconciler<'_, A>,
    args: OverrideAddArgs,
) -> Result<()> {
    let ips = dns::parse_ip_list(&args.ip)?;

    if args.overwrite {
        let hostname = format!("{}.{}", args.host, args.domain);
        let purged = reconciler
            .purge_mismatched(&hostname, &ips, args.apply)
            .await?;
        if purged > 0 {
            info!("removed {} stale override(s) for {}", purged, hostname);
        }
    }

    let data = reconciler
        .add_override(&args.host, &args.domain, &ips, args.descr, args.apply)
        .await?;
    print_value(ctx.mode, &data)
}

/// Delete records matching host, domain and the verbatim IP list, asking
/// for confirmation per record. Walks in descending id order so the ids of
/// records still pending stay valid as confirmed ones disappear.
pub(crate) async fn delete_exact<A: UnboundApi + Sync>(
    reconciler: &Reconciler<'_, A>,
    args: &OverrideDeleteArgs,
    confirm: &mut dyn Confirm,
) -> Result<usize> {
    let handles = reconciler.list_overrides().await?;
    let mut targets: Vec<OverrideHandle> = handles
        .into_iter()
        .filter(|handle| {
            handle.record.matches_name(&args.host, &args.domain)
                && handle
                    .record
                    .ip
                    .to_string()
                    .eq_ignore_ascii_case(args.ip.trim())
        })
        .collect();
    targets.sort_unstable_by(|a, b| b.id.cmp(&a.id));

    confirm_and_delete(reconciler, targets, args.apply, confirm).await
}

pub(crate) async fn delete_host<A: UnboundApi + Sync>(
    reconciler: &Reconciler<'_, A>,
    args: &OverrideDeleteHostArgs,
    confirm: &mut dyn Confirm,
) -> Result<usize> {
    let mut targets = reconciler.find_by_hostname(&args.hostname).await?;
    targets.sort_unstable_by(|a, b| b.id.cmp(&a.id));

    confirm_and_delete(reconciler, targets, args.apply, confirm).await
}

async fn confirm_and_delete<A: UnboundApi + Sync>(
    reconciler: &Reconciler<'_, A>,
    targets: Vec<OverrideHandle>,
    apply: bool,
    confirm: &mut dyn Confirm,
) -> Result<usize> {
    let mut deleted = 0;
    for handle in targets {
        println!("Target:");
        println!(
            "{}",
            render_table(OVERRIDE_HEADERS, &override_rows(std::slice::from_ref(&handle)))
        );
        if confirm.confirm("Please confirm deletion:")? {
            reconciler.delete_by_id(handle.id, apply).await?;
            deleted += 1;
        }
    }
    Ok(deleted)
}

async fn sync_override<A: UnboundApi + Sync>(
    reconciler: &Reconciler<'_, A>,
    args: OverrideSyncArgs,
) -> Result<()> {
    let desired = match &args.ip {
        Some(list) => dns::parse_ip_list(list)?,
        None => dns::resolve(&args.hostname, args.nameserver.as_deref()).await?,
    };
    if desired.is_empty() {
        bail!("resolved no IPv4 addresses for {}", args.hostname);
    }

    let outcome = reconciler
        .synchronize(&args.hostname, &desired, args.apply)
        .await?;
    match outcome {
        SyncOutcome::AlreadySynchronized { deleted } => {
            println!(
                "{} already synchronized ({} stale override(s) removed)",
                args.hostname, deleted
            );
        }
        SyncOutcome::Created { deleted } => {
            println!(
                "created override for {} => {} ({} stale override(s) removed)",
                args.hostname,
                desired
                    .iter()
                    .map(|ip| ip.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                deleted
            );
        }
    }
    Ok(())
}

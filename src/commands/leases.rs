use anyhow::{bail, Result};
use log::{debug, warn};
use serde_json::Value;

use super::{print_value, value_contains, CommandContext};
use crate::api::models::{Lease, LeaseState};
use crate::api::ApiError;
use crate::args::{LeaseCommands, LeaseDeleteArgs, LeaseListArgs, OutputMode};
use crate::confirm::Confirm;
use crate::view::{lease_rows, render_table, LEASE_HEADERS};

pub async fn handle_leases(
    ctx: &CommandContext,
    confirm: &mut dyn Confirm,
    command: LeaseCommands,
) -> Result<()> {
    match command {
        LeaseCommands::List(args) => {
            let leases = ctx.client.dhcpd_leases().await?;
            let filtered = filter_leases(leases, &args);
            if ctx.mode == OutputMode::Table {
                println!("{}", render_table(LEASE_HEADERS, &lease_rows(&filtered)));
                Ok(())
            } else {
                print_value(ctx.mode, &filtered)
            }
        }
        LeaseCommands::Delete(args) => {
            ensure_selector(&args)?;
            let leases = ctx.client.dhcpd_leases().await?;
            delete_leases(&leases, &args, confirm)
        }
    }
}

pub(crate) fn filter_leases(leases: Vec<Lease>, args: &LeaseListArgs) -> Vec<Lease> {
    leases
        .into_iter()
        .filter(|lease| args.expired || lease.state != LeaseState::Expired)
        .filter(|lease| match &args.find {
            Some(needle) => lease_contains(lease, needle),
            None => true,
        })
        .collect()
}

fn lease_contains(lease: &Lease, needle: &str) -> bool {
    serde_json::to_value(lease)
        .map(|value| value_contains(&value, needle))
        .unwrap_or(false)
}

fn ensure_selector(args: &LeaseDeleteArgs) -> Result<()> {
    if args.mac.is_none() && args.hostname.is_none() && args.ip.is_none() {
        bail!("please specify one of --mac, --hostname or --ip");
    }
    Ok(())
}

pub(crate) fn select_leases<'a>(leases: &'a [Lease], args: &LeaseDeleteArgs) -> Vec<&'a Lease> {
    leases
        .iter()
        .filter(|lease| {
            if let Some(mac) = &args.mac {
                if !lease.mac.eq_ignore_ascii_case(mac) {
                    debug!("skipping lease, MAC doesn't match: {:?}", lease);
                    return false;
                }
            }
            if let Some(hostname) = &args.hostname {
                let matched = lease
                    .hostname
                    .as_deref()
                    .is_some_and(|h| h.eq_ignore_ascii_case(hostname));
                if !matched {
                    debug!("skipping lease, hostname doesn't match: {:?}", lease);
                    return false;
                }
            }
            if let Some(ip) = &args.ip {
                if lease.ip != *ip {
                    debug!("skipping lease, IP doesn't match: {:?}", lease);
                    return false;
                }
            }
            true
        })
        .collect()
}

/// The remote API has no lease-deletion endpoint. The capability gap is only
/// reported once the operator has confirmed a concrete target, so declining
/// every prompt exits cleanly.
pub(crate) fn delete_leases(
    leases: &[Lease],
    args: &LeaseDeleteArgs,
    confirm: &mut dyn Confirm,
) -> Result<()> {
    let targets = select_leases(leases, args);
    if targets.is_empty() {
        warn!("no lease matched the given selectors");
        return Ok(());
    }

    for lease in targets {
        println!("Target:");
        print_lease_fields(lease);
        if confirm.confirm("Please confirm deletion:")? {
            return Err(ApiError::Unsupported {
                operation: "lease deletion".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn print_lease_fields(lease: &Lease) {
    let Ok(Value::Object(map)) = serde_json::to_value(lease) else {
        return;
    };
    for (key, item) in &map {
        if key == "staticmap_array_index" {
            continue;
        }
        let text = match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            continue;
        }
        println!("{key:10} {text}");
    }
}

use anyhow::{Context, Result};
use chrono::DateTime;
use serde_json::Value;

use super::{print_value, CommandContext};
use crate::api::models::ConfigHistoryEntry;
use crate::args::{LogCommands, OutputMode};

pub async fn handle_logs(ctx: &CommandContext, command: LogCommands) -> Result<()> {
    match command {
        LogCommands::System => print_entries(ctx.mode, &ctx.client.system_log().await?),
        LogCommands::Dhcp => print_entries(ctx.mode, &ctx.client.dhcp_log().await?),
        LogCommands::Firewall => print_entries(ctx.mode, &ctx.client.firewall_log().await?),
        LogCommands::ConfigHistory { find } => {
            let mut entries = ctx.client.config_history_log().await?;
            if let Some(needle) = &find {
                entries.retain(|entry| {
                    entry
                        .description
                        .as_deref()
                        .is_some_and(|descr| descr.contains(needle))
                });
            }
            print_history(ctx.mode, &entries)
        }
    }
}

fn print_entries(mode: OutputMode, entries: &[Value]) -> Result<()> {
    if mode != OutputMode::Table {
        return print_value(mode, &entries);
    }
    for entry in entries {
        match entry {
            Value::String(line) => println!("{}", line),
            other => println!("{}", other),
        }
    }
    Ok(())
}

fn print_history(mode: OutputMode, entries: &[ConfigHistoryEntry]) -> Result<()> {
    if mode != OutputMode::Table {
        return print_value(mode, &entries);
    }
    for entry in entries {
        println!("{}", format_history_entry(entry)?);
    }
    Ok(())
}

fn format_history_entry(entry: &ConfigHistoryEntry) -> Result<String> {
    let when = DateTime::from_timestamp_millis(entry.time)
        .with_context(|| format!("log entry has an out-of-range timestamp: {}", entry.time))?;
    let mut line = when.format("%Y-%m-%d %H:%M:%S").to_string();
    if let Some(descr) = entry.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!(" ({descr})"));
    }
    Ok(line)
}

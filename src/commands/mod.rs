use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::api::PfSenseClient;
use crate::args::OutputMode;
use crate::view;

pub mod leases;
pub mod logs;
pub mod overrides;
pub mod status;

pub struct CommandContext {
    pub client: PfSenseClient,
    pub mode: OutputMode,
}

impl CommandContext {
    pub fn new(client: PfSenseClient, mode: OutputMode) -> Self {
        Self { client, mode }
    }
}

/// Print a serializable value in the selected output format. Table mode has
/// no schema for free-form data, so it falls back to pretty JSON.
pub fn print_value<T: Serialize>(mode: OutputMode, value: &T) -> Result<()> {
    let rendered = match mode {
        OutputMode::Yaml => view::to_pretty_yaml(value)?,
        OutputMode::Json | OutputMode::Table => view::to_pretty_json(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Substring match across every scalar in a JSON value, mirroring the
/// wildcard `--find` behavior of the endpoints' list commands.
pub(crate) fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => s.contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Object(map) => map.values().any(|item| value_contains(item, needle)),
        other => other.to_string().contains(needle),
    }
}

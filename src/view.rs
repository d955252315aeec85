use anyhow::Result;
use serde::Serialize;

use crate::api::models::{Lease, LeaseState, OverrideHandle};

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn to_pretty_yaml<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Render rows as a fixed-width table, one header line followed by one line
/// per row, columns padded to the widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .map(|row| row.get(idx).map_or(0, String::len))
                .fold(header.len(), usize::max)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    lines.push(format_row(&header_cells, &widths));
    for row in rows {
        lines.push(format_row(row, &widths));
    }
    lines.join("\n")
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| format!("{:<width$}", cell, width = widths[idx]))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn lease_state_label(state: LeaseState) -> &'static str {
    match state {
        LeaseState::Active => "active",
        LeaseState::Expired => "expired",
        LeaseState::Static => "static",
        LeaseState::Unknown => "unknown",
    }
}

pub const LEASE_HEADERS: &[&str] = &["TYPE", "MAC", "IP", "HOSTNAME", "STATE", "DESCR"];

pub fn lease_rows(leases: &[Lease]) -> Vec<Vec<String>> {
    leases
        .iter()
        .map(|lease| {
            vec![
                lease.kind.clone().unwrap_or_default(),
                lease.mac.clone(),
                lease.ip.clone(),
                lease.hostname.clone().unwrap_or_default(),
                lease_state_label(lease.state).to_string(),
                lease.descr.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

pub const OVERRIDE_HEADERS: &[&str] = &["ID", "HOST", "DOMAIN", "IP", "DESCR"];

/// One row per override, plus an indented row per alias. A record with an
/// empty host is a wildcard and shows as `*`.
pub fn override_rows(handles: &[OverrideHandle]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for handle in handles {
        let record = &handle.record;
        let host = if record.host.is_empty() {
            "*".to_string()
        } else {
            record.host.clone()
        };
        rows.push(vec![
            handle.id.to_string(),
            host,
            record.domain.clone(),
            record.ip.to_string(),
            record.descr.clone().unwrap_or_default(),
        ]);
        if let Some(aliases) = &record.aliases {
            for alias in &aliases.item {
                rows.push(vec![
                    String::new(),
                    format!("  alias: {}", alias.host),
                    alias.domain.clone(),
                    String::new(),
                    alias.descr.clone().unwrap_or_default(),
                ]);
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{HostOverride, HostOverrideAlias, HostOverrideAliases, IpList};

    #[test]
    fn render_table_pads_to_widest_cell() {
        let table = render_table(
            &["A", "B"],
            &[
                vec!["x".to_string(), "longer".to_string()],
                vec!["yyyy".to_string(), "z".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "A     B");
        assert_eq!(lines[1], "x     longer");
        assert_eq!(lines[2], "yyyy  z");
    }

    #[test]
    fn override_rows_include_wildcard_host_and_aliases() {
        let handles = vec![OverrideHandle {
            id: 3,
            record: HostOverride {
                host: String::new(),
                domain: "example.com".to_string(),
                ip: IpList(vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]),
                descr: Some("wildcard".to_string()),
                aliases: Some(HostOverrideAliases {
                    item: vec![HostOverrideAlias {
                        host: "www".to_string(),
                        domain: "example.com".to_string(),
                        descr: None,
                    }],
                }),
            },
        }];

        let rows = override_rows(&handles);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "3");
        assert_eq!(rows[0][1], "*");
        assert_eq!(rows[0][3], "10.0.0.1,10.0.0.2");
        assert!(rows[1][1].contains("www"));
    }
}

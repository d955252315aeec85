use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "pfdns", version, about = "CLI for the pfSense REST API")]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Path to the credentials file (default: ~/.config/pfsense-api.json).
    #[arg(long, global = true, env = "PFDNS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level.
    #[arg(long, short = 'l', global = true, value_enum, default_value = "INFO")]
    pub loglevel: LogLevelArg,

    /// Skip interactive confirmation prompts.
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(flatten)]
    pub format: OutputFormatArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum LogLevelArg {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevelArg {
    pub fn filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct OutputFormatArgs {
    /// Emit JSON instead of a table.
    #[arg(long, global = true, conflicts_with = "yaml")]
    pub json: bool,
    /// Emit YAML instead of a table.
    #[arg(long, global = true, conflicts_with = "json")]
    pub yaml: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
    Yaml,
}

impl OutputFormatArgs {
    pub fn mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.yaml {
            OutputMode::Yaml
        } else {
            OutputMode::Table
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Appliance status endpoints.
    Status {
        #[command(subcommand)]
        command: StatusCommands,
    },
    /// DHCP lease commands.
    Leases {
        #[command(subcommand)]
        command: LeaseCommands,
    },
    /// Unbound DNS host-override commands.
    Overrides {
        #[command(subcommand)]
        command: OverrideCommands,
    },
    /// Remote status logs.
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Show the Unbound access list.
    AccessList,
    /// Resolve A records for a hostname.
    Resolve(ResolveArgs),
}

#[derive(Debug, Subcommand)]
pub enum StatusCommands {
    /// System status.
    System,
    /// Gateway status.
    Gateways,
    /// Interface status.
    Interfaces,
    /// OpenVPN status.
    Openvpn,
    /// API version and available updates.
    ApiVersion,
}

#[derive(Debug, Subcommand)]
pub enum LeaseCommands {
    /// List DHCP leases.
    List(LeaseListArgs),
    /// Delete a DHCP lease. The remote API has no endpoint for this; the
    /// command reports the gap after confirmation.
    Delete(LeaseDeleteArgs),
}

#[derive(Debug, Clone, Args)]
pub struct LeaseListArgs {
    /// Only show leases whose fields contain this substring.
    #[arg(long, short = 'f')]
    pub find: Option<String>,
    /// Include expired leases, off by default.
    #[arg(long, short = 'e')]
    pub expired: bool,
}

#[derive(Debug, Clone, Args)]
pub struct LeaseDeleteArgs {
    /// Select by MAC address.
    #[arg(long, short = 'm')]
    pub mac: Option<String>,
    /// Select by hostname.
    #[arg(long = "hostname", short = 'n')]
    pub hostname: Option<String>,
    /// Select by IP address.
    #[arg(long, short = 'i')]
    pub ip: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum OverrideCommands {
    /// List all host overrides.
    List(OverrideListArgs),
    /// List host overrides matching a hostname.
    Get {
        /// Hostname of the override (host.domain).
        hostname: String,
    },
    /// Add a host override.
    Add(OverrideAddArgs),
    /// Delete host overrides matching host, domain and IP exactly.
    Delete(OverrideDeleteArgs),
    /// Delete every host override matching a hostname.
    DeleteHost(OverrideDeleteHostArgs),
    /// Converge the overrides for a hostname to a desired IP list.
    Sync(OverrideSyncArgs),
}

#[derive(Debug, Clone, Args)]
pub struct OverrideListArgs {
    /// Only show overrides whose fields contain this substring.
    #[arg(long, short = 'f')]
    pub find: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct OverrideAddArgs {
    /// Host part of the override.
    pub host: String,
    /// Domain part of the override.
    pub domain: String,
    /// IPv4 address, or a comma-delimited list.
    pub ip: String,
    /// Free-text description stored with the record.
    #[arg(long, short = 'd')]
    pub descr: Option<String>,
    /// Delete existing mismatching records for the same hostname first.
    #[arg(long, short = 'o')]
    pub overwrite: bool,
    /// Hot-reload the resolver instead of leaving the change staged.
    #[arg(long, short = 'a')]
    pub apply: bool,
}

#[derive(Debug, Clone, Args)]
pub struct OverrideDeleteArgs {
    /// Host part of the override.
    pub host: String,
    /// Domain part of the override.
    pub domain: String,
    /// IPv4 address, or a comma-delimited list, matched verbatim.
    pub ip: String,
    /// Hot-reload the resolver instead of leaving the change staged.
    #[arg(long, short = 'a')]
    pub apply: bool,
}

#[derive(Debug, Clone, Args)]
pub struct OverrideDeleteHostArgs {
    /// Hostname of the override (host.domain).
    pub hostname: String,
    /// Hot-reload the resolver instead of leaving the change staged.
    #[arg(long, short = 'a')]
    pub apply: bool,
}

#[derive(Debug, Clone, Args)]
pub struct OverrideSyncArgs {
    /// Hostname of the override (host.domain).
    pub hostname: String,
    /// Resolve the desired IPs for the hostname at this nameserver.
    #[arg(long, conflicts_with = "ip")]
    pub nameserver: Option<String>,
    /// Use this comma-delimited IPv4 list instead of resolving.
    #[arg(long, short = 'i')]
    pub ip: Option<String>,
    /// Hot-reload the resolver instead of leaving the change staged.
    #[arg(long, short = 'a')]
    pub apply: bool,
}

#[derive(Debug, Subcommand)]
pub enum LogCommands {
    /// System status log.
    System,
    /// DHCP status log.
    Dhcp,
    /// Firewall status log.
    Firewall,
    /// Configuration-history status log.
    ConfigHistory {
        /// Only show entries whose description contains this substring.
        #[arg(long, short = 'f')]
        find: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ResolveArgs {
    /// Hostname to resolve.
    pub hostname: String,
    /// Query this nameserver instead of the system resolver.
    #[arg(long)]
    pub nameserver: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_format_mode_prefers_json_then_yaml() {
        let args = OutputFormatArgs {
            json: true,
            yaml: false,
        };
        assert_eq!(args.mode(), OutputMode::Json);

        let args = OutputFormatArgs {
            json: false,
            yaml: true,
        };
        assert_eq!(args.mode(), OutputMode::Yaml);

        let args = OutputFormatArgs {
            json: false,
            yaml: false,
        };
        assert_eq!(args.mode(), OutputMode::Table);
    }

    #[test]
    fn sync_rejects_nameserver_combined_with_literal_ips() {
        let result = Cli::try_parse_from([
            "pfdns",
            "overrides",
            "sync",
            "web.example.com",
            "--nameserver",
            "10.0.0.53",
            "--ip",
            "10.0.0.1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn loglevel_parses_upper_case_names() {
        let cli = Cli::try_parse_from(["pfdns", "-l", "DEBUG", "status", "system"]).unwrap();
        assert_eq!(cli.globals.loglevel, LogLevelArg::Debug);
    }
}

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use validator::Validate;

/// Credentials and connection settings for one pfSense appliance.
///
/// Loaded once per invocation from a JSON file, never written back.
///
/// Example config file:
/// ```json
/// {
///     "hostname": "firewall.example.com",
///     "port": 8443,
///     "client_id": "admin",
///     "client_token": "mysupersecrettoken"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PfSenseConfig {
    #[validate(length(min = 1, message = "hostname cannot be empty"))]
    pub hostname: String,

    #[serde(default = "default_port")]
    #[validate(range(min = 1, message = "port must be greater than 0"))]
    pub port: u16,

    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub jwt: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_token: Option<String>,

    /// Certificate verification toggle. Most appliances run on self-signed
    /// certificates, so this defaults to off.
    #[serde(default)]
    pub verify: bool,
}

fn default_port() -> u16 {
    443
}

fn default_mode() -> String {
    "local".to_string()
}

/// The credentials the config resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: {client_id} {client_token}` (no scheme).
    Token {
        client_id: String,
        client_token: String,
    },
    /// `Authorization: Bearer {jwt}`.
    Jwt(String),
    /// HTTP basic auth from `username`/`password`.
    Basic { username: String, password: String },
}

impl PfSenseConfig {
    /// Default config location: `~/.config/pfsense-api.json`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("pfsense-api.json"));
        }

        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| anyhow::anyhow!("HOME is not set and XDG_CONFIG_HOME is not set"))?;
        Ok(home.join(".config").join("pfsense-api.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }

        let mut file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: PfSenseConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        // Resolving credentials also checks that some auth mode is present.
        config.auth()?;

        Ok(config)
    }

    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.hostname, self.port)
    }

    /// Resolve the configured credentials. A `client_id`/`client_token` pair
    /// wins over `jwt`, which wins over `username`/`password`.
    pub fn auth(&self) -> Result<Auth> {
        if let (Some(client_id), Some(client_token)) = (&self.client_id, &self.client_token) {
            return Ok(Auth::Token {
                client_id: client_id.clone(),
                client_token: client_token.clone(),
            });
        }
        if let Some(jwt) = &self.jwt {
            return Ok(Auth::Jwt(jwt.clone()));
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Ok(Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            });
        }
        bail!("config has no credentials: set client_id/client_token, jwt, or username/password")
    }
}

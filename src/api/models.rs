use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::ApiError;

/// Status codes the API is documented to put in the response envelope.
const VALID_ENVELOPE_CODES: &[i64] = &[200, 400, 401, 403, 404, 500];

/// Standard JSON envelope around every pfSense API response. `data` is a
/// mapping or a sequence depending on the endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub code: i64,
    #[serde(rename = "return")]
    pub return_code: i64,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Reject envelopes with a status code outside the documented set
    /// before any data reaches the caller.
    pub fn check_code(&self) -> Result<(), ApiError> {
        if VALID_ENVELOPE_CODES.contains(&self.code) {
            Ok(())
        } else {
            Err(ApiError::InvalidEnvelopeCode { code: self.code })
        }
    }
}

/// Ordered list of IPv4 address strings for a host override.
///
/// The remote returns the field as a single comma-joined string but expects
/// a JSON list on insert, so deserialization accepts both shapes and
/// serialization always emits a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpList(pub Vec<String>);

impl IpList {
    pub fn from_addrs(addrs: &[Ipv4Addr]) -> Self {
        IpList(addrs.iter().map(Ipv4Addr::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse every entry. Fails on the first entry that is not an IPv4
    /// address literal.
    pub fn addrs(&self) -> Result<Vec<Ipv4Addr>, std::net::AddrParseError> {
        self.0.iter().map(|ip| Ipv4Addr::from_str(ip)).collect()
    }

    /// Order-insensitive comparison against a desired address set. A list
    /// that does not parse as IPv4 addresses never matches.
    pub fn matches(&self, desired: &[Ipv4Addr]) -> bool {
        let Ok(mut ours) = self.addrs() else {
            return false;
        };
        ours.sort_unstable();
        let mut theirs = desired.to_vec();
        theirs.sort_unstable();
        ours == theirs
    }
}

impl fmt::Display for IpList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

impl<'de> Deserialize<'de> for IpList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Joined(String),
            List(Vec<String>),
        }

        let ips = match Wire::deserialize(deserializer)? {
            Wire::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            Wire::List(list) => list,
        };
        Ok(IpList(ips))
    }
}

impl Serialize for IpList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// One Unbound DNS host-override record as stored on the appliance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostOverride {
    pub host: String,
    pub domain: String,
    #[serde(default)]
    pub ip: IpList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_aliases",
        skip_serializing_if = "Option::is_none"
    )]
    pub aliases: Option<HostOverrideAliases>,
}

impl HostOverride {
    /// `(host, domain)` is the logical identity; matching is
    /// case-insensitive on both parts.
    pub fn matches_name(&self, host: &str, domain: &str) -> bool {
        self.host.eq_ignore_ascii_case(host) && self.domain.eq_ignore_ascii_case(domain)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostOverrideAliases {
    #[serde(default)]
    pub item: Vec<HostOverrideAlias>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostOverrideAlias {
    pub host: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
}

// The appliance emits `"aliases": ""` when a record has none.
fn deserialize_aliases<'de, D>(deserializer: D) -> Result<Option<HostOverrideAliases>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_object() {
        serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom)
    } else {
        Ok(None)
    }
}

/// A host override tagged with its position in the fetch-order list.
///
/// The id is only meaningful against the snapshot it was fetched with; it
/// goes stale the instant the remote list changes and must never be carried
/// across fetches.
#[derive(Debug, Clone, Serialize)]
pub struct OverrideHandle {
    pub id: usize,
    #[serde(flatten)]
    pub record: HostOverride,
}

/// Insert payload for a new host override. `apply` controls whether the
/// change is hot-reloaded into the running resolver or left staged.
#[derive(Debug, Clone, Serialize)]
pub struct NewHostOverride {
    pub host: String,
    pub domain: String,
    pub ip: IpList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    pub apply: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaseState {
    Active,
    Expired,
    Static,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One DHCP lease. Read-only: the remote service has no delete endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub mac: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default)]
    pub state: LeaseState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whatever else the endpoint reports (online flag, timestamps, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One configuration-history log entry. `time` is epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigHistoryEntry {
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ip_list_deserializes_from_comma_joined_string() {
        let record: HostOverride = serde_json::from_value(json!({
            "host": "web",
            "domain": "example.com",
            "ip": "10.0.0.1, 10.0.0.2",
        }))
        .unwrap();
        assert_eq!(record.ip.0, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn ip_list_deserializes_from_list() {
        let record: HostOverride = serde_json::from_value(json!({
            "host": "web",
            "domain": "example.com",
            "ip": ["10.0.0.1", "10.0.0.2"],
        }))
        .unwrap();
        assert_eq!(record.ip.0, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn ip_list_serializes_as_list() {
        let payload = NewHostOverride {
            host: "web".to_string(),
            domain: "example.com".to_string(),
            ip: IpList(vec!["10.0.0.1".to_string()]),
            descr: None,
            apply: false,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["ip"], json!(["10.0.0.1"]));
    }

    #[test]
    fn ip_list_matches_is_order_insensitive() {
        let list = IpList(vec!["10.0.0.2".to_string(), "10.0.0.1".to_string()]);
        let desired = vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()];
        assert!(list.matches(&desired));
        assert!(!list.matches(&desired[..1]));
    }

    #[test]
    fn ip_list_with_unparseable_entry_never_matches() {
        let list = IpList(vec!["not-an-ip".to_string()]);
        assert!(!list.matches(&[]));
    }

    #[test]
    fn envelope_rejects_undocumented_code() {
        let response: ApiResponse<serde_json::Value> = serde_json::from_value(json!({
            "status": "ok",
            "code": 999,
            "return": 0,
            "message": "",
            "data": {},
        }))
        .unwrap();
        let err = response.check_code().unwrap_err();
        assert!(err.to_string().contains("999"));
    }

    #[test]
    fn envelope_accepts_documented_codes() {
        for code in [200, 400, 401, 403, 404, 500] {
            let response: ApiResponse<serde_json::Value> = serde_json::from_value(json!({
                "status": "ok",
                "code": code,
                "return": 0,
                "message": "",
                "data": [],
            }))
            .unwrap();
            assert!(response.check_code().is_ok());
        }
    }

    #[test]
    fn aliases_tolerate_empty_string() {
        let record: HostOverride = serde_json::from_value(json!({
            "host": "web",
            "domain": "example.com",
            "ip": "10.0.0.1",
            "aliases": "",
        }))
        .unwrap();
        assert!(record.aliases.is_none());

        let record: HostOverride = serde_json::from_value(json!({
            "host": "web",
            "domain": "example.com",
            "ip": "10.0.0.1",
            "aliases": {"item": [{"host": "www", "domain": "example.com"}]},
        }))
        .unwrap();
        assert_eq!(record.aliases.unwrap().item.len(), 1);
    }

    #[test]
    fn matches_name_is_case_insensitive() {
        let record: HostOverride = serde_json::from_value(json!({
            "host": "Web",
            "domain": "Example.COM",
            "ip": "10.0.0.1",
        }))
        .unwrap();
        assert!(record.matches_name("web", "example.com"));
        assert!(!record.matches_name("web", "example.org"));
    }

    #[test]
    fn lease_state_falls_back_to_unknown() {
        let lease: Lease = serde_json::from_value(json!({
            "mac": "aa:bb:cc:dd:ee:ff",
            "ip": "192.168.1.10",
            "state": "something-new",
            "online": true,
        }))
        .unwrap();
        assert_eq!(lease.state, LeaseState::Unknown);
        assert_eq!(lease.extra["online"], json!(true));

        let lease: Lease = serde_json::from_value(json!({
            "mac": "aa:bb:cc:dd:ee:ff",
            "ip": "192.168.1.10",
            "state": "expired",
        }))
        .unwrap();
        assert_eq!(lease.state, LeaseState::Expired);
    }
}

use std::net::Ipv4Addr;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::models::{HostOverride, IpList, NewHostOverride};
use crate::api::UnboundApi;

/// In-memory double for the Unbound endpoints with positional-id semantics:
/// deleting index k shifts every later record down, exactly like the remote
/// store re-derives ids from list position.
pub(crate) struct FakeUnbound {
    store: Mutex<Vec<HostOverride>>,
}

impl FakeUnbound {
    pub(crate) fn with_records(records: Vec<HostOverride>) -> Self {
        Self {
            store: Mutex::new(records),
        }
    }

    pub(crate) fn records(&self) -> Vec<HostOverride> {
        self.store.lock().unwrap().clone()
    }
}

#[async_trait]
impl UnboundApi for FakeUnbound {
    async fn fetch_host_overrides(&self) -> Result<Vec<HostOverride>> {
        Ok(self.store.lock().unwrap().clone())
    }

    async fn create_host_override(&self, payload: &NewHostOverride) -> Result<Value> {
        let record = HostOverride {
            host: payload.host.clone(),
            domain: payload.domain.clone(),
            ip: payload.ip.clone(),
            descr: payload.descr.clone(),
            aliases: None,
        };
        self.store.lock().unwrap().push(record);
        Ok(json!([]))
    }

    async fn delete_host_override(&self, id: usize, _apply: bool) -> Result<Value> {
        let mut store = self.store.lock().unwrap();
        if id >= store.len() {
            bail!("no host override with id {}", id);
        }
        store.remove(id);
        Ok(json!([]))
    }
}

pub(crate) fn record(host: &str, domain: &str, ips: &[&str]) -> HostOverride {
    HostOverride {
        host: host.to_string(),
        domain: domain.to_string(),
        ip: IpList(ips.iter().map(|s| s.to_string()).collect()),
        descr: None,
        aliases: None,
    }
}

pub(crate) fn ips(list: &[&str]) -> Vec<Ipv4Addr> {
    list.iter().map(|s| s.parse().unwrap()).collect()
}

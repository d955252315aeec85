use std::net::Ipv4Addr;

use anyhow::Result;
use log::{debug, info};
use serde_json::Value;

use crate::api::models::{IpList, NewHostOverride, OverrideHandle};
use crate::api::UnboundApi;
use crate::dns::split_hostname;

/// Converges the appliance's host-override table toward a desired state.
///
/// Every operation works on a single fresh fetch; positional ids never
/// survive past the snapshot they came from. Multi-record deletions run in
/// descending id order so the ids still pending stay valid as earlier
/// records disappear.
pub struct Reconciler<'a, A: UnboundApi + Sync> {
    api: &'a A,
}

/// What `synchronize` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// An existing record already carried the desired IP set.
    AlreadySynchronized { deleted: usize },
    /// A fresh record was inserted after removing `deleted` stale ones.
    Created { deleted: usize },
}

impl<'a, A: UnboundApi + Sync> Reconciler<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Fetch the full override list, tagging each record with its position
    /// in the fetch order.
    pub async fn list_overrides(&self) -> Result<Vec<OverrideHandle>> {
        let records = self.api.fetch_host_overrides().await?;
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(id, record)| OverrideHandle { id, record })
            .collect())
    }

    /// All records matching `hostname`, case-insensitively on the split
    /// host/domain parts. Duplicates come back as separate handles.
    pub async fn find_by_hostname(&self, hostname: &str) -> Result<Vec<OverrideHandle>> {
        let (host, domain) = split_hostname(hostname)?;
        let mut matches = self.list_overrides().await?;
        matches.retain(|handle| handle.record.matches_name(host, domain));
        Ok(matches)
    }

    pub async fn add_override(
        &self,
        host: &str,
        domain: &str,
        ips: &[Ipv4Addr],
        descr: Option<String>,
        apply: bool,
    ) -> Result<Value> {
        let payload = NewHostOverride {
            host: host.to_string(),
            domain: domain.to_string(),
            ip: IpList::from_addrs(ips),
            descr,
            apply,
        };
        debug!("adding host override {:?}", payload);
        self.api.create_host_override(&payload).await
    }

    pub async fn delete_by_id(&self, id: usize, apply: bool) -> Result<Value> {
        debug!("deleting host override id {}", id);
        self.api.delete_host_override(id, apply).await
    }

    /// Delete every record matching `hostname`. Returns how many went away.
    pub async fn delete_by_hostname(&self, hostname: &str, apply: bool) -> Result<usize> {
        let mut matches = self.find_by_hostname(hostname).await?;
        matches.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        for handle in &matches {
            self.delete_by_id(handle.id, apply).await?;
        }
        Ok(matches.len())
    }

    /// Remove records matching `hostname` whose IP set differs from
    /// `desired`. Returns how many were removed. Unlike `synchronize`, this
    /// never inserts and never short-circuits.
    pub async fn purge_mismatched(
        &self,
        hostname: &str,
        desired: &[Ipv4Addr],
        apply: bool,
    ) -> Result<usize> {
        let matches = self.find_by_hostname(hostname).await?;
        let mut stale: Vec<usize> = matches
            .iter()
            .filter(|handle| !handle.record.ip.matches(desired))
            .map(|handle| handle.id)
            .collect();
        stale.sort_unstable_by(|a, b| b.cmp(a));
        for id in &stale {
            self.delete_by_id(*id, apply).await?;
        }
        Ok(stale.len())
    }

    /// Converge the overrides for `hostname` to exactly the desired IP set.
    ///
    /// Matches are walked in fetch order. The first record whose IP set
    /// equals `desired` short-circuits the walk; records after it are left
    /// untouched. Mismatching records seen before that point are deleted.
    /// If no record matched, a fresh one is inserted.
    pub async fn synchronize(
        &self,
        hostname: &str,
        desired: &[Ipv4Addr],
        apply: bool,
    ) -> Result<SyncOutcome> {
        let (host, domain) = split_hostname(hostname)?;
        let matches = self.find_by_hostname(hostname).await?;
        debug!("{} existing override(s) for {}", matches.len(), hostname);

        let mut stale = Vec::new();
        let mut synchronized = false;
        for handle in &matches {
            if handle.record.ip.matches(desired) {
                debug!("host override already exists => {:?}", handle.record);
                synchronized = true;
                break;
            }
            stale.push(handle.id);
        }

        stale.sort_unstable_by(|a, b| b.cmp(a));
        for id in &stale {
            self.delete_by_id(*id, apply).await?;
        }

        if synchronized {
            info!("{} already synchronized", hostname);
            return Ok(SyncOutcome::AlreadySynchronized {
                deleted: stale.len(),
            });
        }

        self.add_override(host, domain, desired, None, apply).await?;
        info!("created override for {} => {:?}", hostname, desired);
        Ok(SyncOutcome::Created {
            deleted: stale.len(),
        })
    }
}

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use log::debug;

/// Split a fully qualified hostname on the first dot into (host, domain).
pub fn split_hostname(hostname: &str) -> Result<(&str, &str)> {
    match hostname.split_once('.') {
        Some((host, domain)) if !host.is_empty() && !domain.is_empty() => Ok((host, domain)),
        _ => bail!("expected a fully qualified hostname (host.domain), got '{hostname}'"),
    }
}

pub fn is_ipv4(value: &str) -> bool {
    Ipv4Addr::from_str(value).is_ok()
}

/// Parse a comma-delimited IPv4 list as given on the command line.
pub fn parse_ip_list(value: &str) -> Result<Vec<Ipv4Addr>> {
    let mut ips = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let ip = Ipv4Addr::from_str(part)
            .with_context(|| format!("'{part}' is not an IPv4 address"))?;
        ips.push(ip);
    }
    if ips.is_empty() {
        bail!("no IPv4 addresses in '{value}'");
    }
    Ok(ips)
}

/// Resolve A records through the system resolver (getaddrinfo), sorted and
/// deduplicated.
pub async fn resolve_system(hostname: &str) -> Result<Vec<Ipv4Addr>> {
    let addrs = tokio::net::lookup_host((hostname, 0))
        .await
        .with_context(|| format!("Failed to resolve {hostname} via the system resolver"))?;

    let mut ips: Vec<Ipv4Addr> = addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .collect();
    ips.sort_unstable();
    ips.dedup();
    Ok(ips)
}

/// Query A records for `hostname` directly at `nameserver` (UDP port 53).
/// The nameserver may be given as an IPv4 literal or as a name, which is
/// then resolved through the system resolver first.
pub async fn resolve_at(hostname: &str, nameserver: &str) -> Result<Vec<Ipv4Addr>> {
    use hickory_client::client::{AsyncClient, ClientHandle};
    use hickory_client::rr::{DNSClass, Name, RData, RecordType};
    use hickory_client::udp::UdpClientStream;

    let server_ip = if is_ipv4(nameserver) {
        nameserver.parse()?
    } else {
        resolve_system(nameserver)
            .await?
            .into_iter()
            .next()
            .with_context(|| format!("Nameserver {nameserver} did not resolve to an IPv4 address"))?
    };
    let server_addr = SocketAddr::from((server_ip, 53));
    debug!("querying {} for A records of {}", server_addr, hostname);

    let stream = UdpClientStream::<tokio::net::UdpSocket>::new(server_addr);
    let (mut client, bg) = AsyncClient::connect(stream)
        .await
        .with_context(|| format!("Failed to connect to nameserver {server_addr}"))?;
    tokio::spawn(bg);

    let name =
        Name::from_str(hostname).with_context(|| format!("Invalid hostname: {hostname}"))?;
    let response = client
        .query(name, DNSClass::IN, RecordType::A)
        .await
        .with_context(|| format!("Failed to query A records for {hostname} on {server_addr}"))?;

    let mut ips: Vec<Ipv4Addr> = response
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::A(a)) => Some(a.0),
            _ => None,
        })
        .collect();
    ips.sort_unstable();
    ips.dedup();
    Ok(ips)
}

/// Resolve A records for `hostname`, at an explicit nameserver when one is
/// given and through the system resolver otherwise.
pub async fn resolve(hostname: &str, nameserver: Option<&str>) -> Result<Vec<Ipv4Addr>> {
    match nameserver {
        Some(ns) => resolve_at(hostname, ns).await,
        None => resolve_system(hostname).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_hostname_splits_on_first_dot() {
        assert_eq!(
            split_hostname("web.example.com").unwrap(),
            ("web", "example.com")
        );
        assert_eq!(split_hostname("a.b").unwrap(), ("a", "b"));
    }

    #[test]
    fn split_hostname_rejects_bare_and_degenerate_names() {
        assert!(split_hostname("localhost").is_err());
        assert!(split_hostname(".example.com").is_err());
        assert!(split_hostname("web.").is_err());
        assert!(split_hostname("").is_err());
    }

    #[test]
    fn is_ipv4_only_accepts_address_literals() {
        assert!(is_ipv4("10.0.0.1"));
        assert!(!is_ipv4("10.0.0"));
        assert!(!is_ipv4("ns1.example.com"));
        assert!(!is_ipv4("::1"));
    }

    #[test]
    fn parse_ip_list_handles_commas_and_whitespace() {
        let ips = parse_ip_list("10.0.0.2, 10.0.0.1,").unwrap();
        assert_eq!(ips.len(), 2);
        assert_eq!(ips[0], Ipv4Addr::new(10, 0, 0, 2));
    }

    #[test]
    fn parse_ip_list_rejects_garbage_and_empty_input() {
        assert!(parse_ip_list("10.0.0.1,nope").is_err());
        assert!(parse_ip_list(" , ").is_err());
    }
}

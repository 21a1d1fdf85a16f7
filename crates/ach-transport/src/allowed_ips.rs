//! CIDR-based allow-listing of a transport's resolved hostname (spec.md
//! §4.3 step 4: "Enforce the optional allowed-IP CIDR list against the
//! agent's hostname by DNS lookup"). IPv4-only, matching the NACHA
//! ecosystem's ODFI endpoints; a bare string list rather than a crate
//! dependency since the check is a handful of lines of bit arithmetic.

use crate::error::{Result, TransportError};
use std::net::Ipv4Addr;

/// Resolves `hostname` and checks whether any resolved address falls
/// within at least one of `allowed_cidrs`. An empty `allowed_cidrs` means
/// "no restriction configured" and always passes.
pub async fn check_hostname_allowed(hostname: &str, port: u16, allowed_cidrs: &[String]) -> Result<()> {
    if allowed_cidrs.is_empty() {
        return Ok(());
    }
    let addrs = resolve(hostname, port).await?;
    let cidrs: Vec<(Ipv4Addr, u8)> = allowed_cidrs
        .iter()
        .map(|c| parse_cidr(c))
        .collect::<Result<_>>()?;

    let allowed = addrs.iter().any(|addr| cidrs.iter().any(|(net, bits)| contains(*net, *bits, *addr)));
    if allowed {
        Ok(())
    } else {
        Err(TransportError::HostnameNotAllowed { hostname: hostname.to_string() })
    }
}

async fn resolve(hostname: &str, port: u16) -> Result<Vec<Ipv4Addr>> {
    let target = format!("{hostname}:{port}");
    tokio::task::spawn_blocking(move || {
        use std::net::ToSocketAddrs;
        target
            .to_socket_addrs()
            .map_err(|e| TransportError::DnsResolution { hostname: target.clone(), source: e })
            .map(|it| it.filter_map(|a| match a.ip() { std::net::IpAddr::V4(v4) => Some(v4), _ => None }).collect())
    })
    .await?
}

fn parse_cidr(cidr: &str) -> Result<(Ipv4Addr, u8)> {
    let (addr, bits) = cidr.split_once('/').ok_or_else(|| TransportError::InvalidCidr(cidr.to_string()))?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| TransportError::InvalidCidr(cidr.to_string()))?;
    let bits: u8 = bits.parse().map_err(|_| TransportError::InvalidCidr(cidr.to_string()))?;
    if bits > 32 {
        return Err(TransportError::InvalidCidr(cidr.to_string()));
    }
    Ok((addr, bits))
}

fn contains(network: Ipv4Addr, prefix_bits: u8, addr: Ipv4Addr) -> bool {
    if prefix_bits == 0 {
        return true;
    }
    let mask = u32::MAX << (32 - prefix_bits as u32);
    u32::from(network) & mask == u32::from(addr) & mask
}

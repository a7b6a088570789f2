// # System Address Detection
//
// This crate provides the `AddressDetector` implementation used by the
// ipsync binary.
//
// ## Detection policy
//
// - **Internal IPv4**: an ordered list of probes, each returning an optional
//   address; the first non-absent result wins.
//   1. interface scan — enumerate all host interfaces and take the first
//      non-loopback RFC 1918 address
//   2. socket probe — connect a UDP socket toward a public address (no
//      packets are sent) and read back the locally bound address, discarding
//      it unless it is actually private
// - **External IPv4/IPv6**: TXT query for a well-known reflector name over a
//   resolver pinned to IPv4-only or IPv6-only nameservers, forcing the query
//   to travel over the address family being detected.
//
// Every probe collapses failure to absence after logging it; callers never
// see an error. Probes retain no state between calls.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, UdpSocket};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use tracing::{debug, warn};

use ipsync_core::traits::AddressDetector;

/// TXT record that echoes the public address the query arrived from.
const REFLECTOR_NAME: &str = "o-o.myaddr.l.google.com.";

/// IPv4-only nameservers, forcing an IPv4 query path.
const V4_NAMESERVERS: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
    IpAddr::V4(Ipv4Addr::new(8, 8, 4, 4)),
];

/// IPv6-only nameservers, forcing an IPv6 query path.
const V6_NAMESERVERS: [IpAddr; 2] = [
    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)),
    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8844)),
];

/// Target for the socket probe. connect() on a datagram socket only selects
/// a route and source address; nothing is transmitted.
const PROBE_TARGET: &str = "8.8.8.8:80";

/// Upper bound on any single DNS query.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

type InternalProbe = fn() -> Option<Ipv4Addr>;

/// Internal probes in priority order; the first address wins.
const INTERNAL_PROBES: &[(&str, InternalProbe)] = &[
    ("interface-scan", interface_scan),
    ("socket-probe", socket_probe),
];

/// Detects host addresses with live system and network probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDetector;

impl SystemDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AddressDetector for SystemDetector {
    async fn internal_ipv4(&self) -> Option<Ipv4Addr> {
        for (name, probe) in INTERNAL_PROBES {
            if let Some(addr) = probe() {
                debug!("found internal IPv4 {} via {}", addr, name);
                return Some(addr);
            }
        }

        warn!("no internal IPv4 address found");
        None
    }

    async fn external_ipv4(&self) -> Option<Ipv4Addr> {
        let answer = reflector_query(&V4_NAMESERVERS).await?;
        match parse_txt_answer::<Ipv4Addr>(&answer) {
            Some(addr) => {
                debug!("found external IPv4 {}", addr);
                Some(addr)
            }
            None => {
                warn!("TXT answer {:?} is not an IPv4 address", answer);
                None
            }
        }
    }

    async fn external_ipv6(&self) -> Option<Ipv6Addr> {
        let answer = reflector_query(&V6_NAMESERVERS).await?;
        match parse_txt_answer::<Ipv6Addr>(&answer) {
            Some(addr) => {
                debug!("found external IPv6 {}", addr);
                Some(addr)
            }
            None => {
                warn!("TXT answer {:?} is not an IPv6 address", answer);
                None
            }
        }
    }
}

/// True for addresses inside 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16.
pub fn is_rfc1918(addr: Ipv4Addr) -> bool {
    let octets = addr.octets();
    match octets[0] {
        10 => true,
        172 => (16..=31).contains(&octets[1]),
        192 => octets[1] == 168,
        _ => false,
    }
}

/// First RFC 1918 address assigned to a non-loopback interface.
fn interface_scan() -> Option<Ipv4Addr> {
    let interfaces = match get_if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("interface enumeration failed: {}", e);
            return None;
        }
    };

    interfaces
        .iter()
        .filter(|interface| !interface.is_loopback())
        .find_map(|interface| match interface.ip() {
            IpAddr::V4(addr) if is_rfc1918(addr) => Some(addr),
            _ => None,
        })
}

/// Read the locally bound address of a connected UDP socket.
fn socket_probe() -> Option<Ipv4Addr> {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(PROBE_TARGET)?;
        Ok(socket.local_addr()?.ip())
    };

    match probe() {
        Ok(IpAddr::V4(addr)) if is_rfc1918(addr) => Some(addr),
        Ok(addr) => {
            debug!("socket probe bound non-private address {}, discarding", addr);
            None
        }
        Err(e) => {
            warn!("socket probe failed: {}", e);
            None
        }
    }
}

/// Query the reflector TXT record over the given nameservers and return the
/// first answer as text.
async fn reflector_query(nameservers: &[IpAddr]) -> Option<String> {
    let group = NameServerConfigGroup::from_ips_clear(nameservers, 53, true);
    let mut opts = ResolverOpts::default();
    opts.timeout = RESOLVE_TIMEOUT;

    let resolver =
        TokioAsyncResolver::tokio(ResolverConfig::from_parts(None, Vec::new(), group), opts);

    let lookup = match resolver.txt_lookup(REFLECTOR_NAME).await {
        Ok(lookup) => lookup,
        Err(e) => {
            warn!("TXT query for {} failed: {}", REFLECTOR_NAME, e);
            return None;
        }
    };

    let answer = lookup.iter().next()?;
    let text = answer
        .txt_data()
        .iter()
        .map(|part| String::from_utf8_lossy(part))
        .collect::<String>();

    Some(text)
}

/// Parse one TXT answer into an address of the expected family.
///
/// Answers can come back surrounded by quote characters; strip them before
/// parsing. Anything that does not parse as the expected family is absence.
fn parse_txt_answer<A: FromStr>(answer: &str) -> Option<A> {
    answer.trim().trim_matches('"').parse().ok()
}

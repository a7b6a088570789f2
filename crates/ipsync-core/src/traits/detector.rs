// # Address Detector Trait
//
// Defines the interface for detecting the host's IP addresses.
//
// ## Implementations
//
// - System probes (interfaces, sockets, resolver queries): `ipsync-ip-system`
//
// ## Failure policy
//
// Detection never fails to the caller. Each method collapses any underlying
// fault (no interfaces found, DNS query failure, timeout, malformed answer)
// to `None` after logging it. Absence is a valid signal — it means the
// corresponding DNS record should not exist — not an error.

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Trait for address detection implementations
///
/// The three methods are independent: each performs its own probes and none
/// retains state between calls. Implementations must be thread-safe.
#[async_trait]
pub trait AddressDetector: Send + Sync {
    /// First private (RFC 1918) IPv4 address assigned to this host.
    async fn internal_ipv4(&self) -> Option<Ipv4Addr>;

    /// Public IPv4 address of this host as seen from outside.
    async fn external_ipv4(&self) -> Option<Ipv4Addr>;

    /// Public IPv6 address of this host as seen from outside.
    async fn external_ipv6(&self) -> Option<Ipv6Addr>;
}

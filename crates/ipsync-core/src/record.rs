//! Record-level data model: desired facts and remote state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// DNS address record kind.
///
/// Serializes to the wire names used by the provider API (`"A"` / `"AAAA"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordKind {
    /// Wire name of the record kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state for one DNS record.
///
/// An absent `address` means the record should not exist. Detection failures
/// upstream collapse to `None`, which the reconciler treats as an
/// authoritative removal signal rather than something to ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFact {
    /// Full DNS record name (e.g., "internal.example.com")
    pub name: String,
    /// Record kind (A or AAAA)
    pub kind: RecordKind,
    /// Address the record should carry, or `None` to remove it
    pub address: Option<IpAddr>,
    /// Whether the record is proxied through the provider's edge
    pub proxied: bool,
}

impl AddressFact {
    /// Create a new desired fact.
    pub fn new(
        name: impl Into<String>,
        kind: RecordKind,
        address: Option<IpAddr>,
        proxied: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            address,
            proxied,
        }
    }
}

/// An existing record as returned by the provider.
///
/// The `id` is what update and delete calls target. It is looked up fresh
/// every run; nothing is cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRecord {
    /// Provider-assigned opaque record id
    pub id: String,
    /// Record kind, from the wire `type` field
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Full DNS record name
    pub name: String,
    /// Address the record currently resolves to
    pub content: IpAddr,
}

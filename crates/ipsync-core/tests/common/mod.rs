//! Test doubles for the reconciliation contract tests.
//!
//! The fakes implement only the trait surface the engine depends on and
//! record every call in order, so tests can assert both outcomes and the
//! exact call sequence.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Mutex;

use async_trait::async_trait;

use ipsync_core::Config;
use ipsync_core::record::RecordKind;
use ipsync_core::traits::{AddressDetector, ZoneClient};

/// A scripted zone client that records every call in order.
pub struct FakeZoneClient {
    records: Mutex<HashMap<(String, RecordKind), String>>,
    failing_names: Vec<String>,
    fail_all: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeZoneClient {
    /// A zone with no records where every mutation succeeds.
    pub fn empty() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            failing_names: Vec::new(),
            fail_all: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A zone where every mutation fails.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::empty()
        }
    }

    /// Seed an existing record.
    pub fn record(self, name: &str, kind: RecordKind, id: &str) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert((name.to_string(), kind), id.to_string());
        self
    }

    /// Make mutations against one record name fail.
    pub fn failing_for(mut self, name: &str) -> Self {
        self.failing_names.push(name.to_string());
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose log entry starts with `prefix`.
    pub fn count_of(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    fn mutation_ok(&self, name: &str) -> bool {
        !self.fail_all && !self.failing_names.iter().any(|n| n == name)
    }
}

#[async_trait]
impl ZoneClient for FakeZoneClient {
    async fn find_record_id(&self, name: &str, kind: RecordKind) -> Option<String> {
        self.log(format!("find {name} {kind}"));
        self.records
            .lock()
            .unwrap()
            .get(&(name.to_string(), kind))
            .cloned()
    }

    async fn create_record(
        &self,
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        _proxied: bool,
    ) -> bool {
        self.log(format!("create {name} {kind} {content}"));
        self.mutation_ok(name)
    }

    async fn update_record(
        &self,
        id: &str,
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        _proxied: bool,
    ) -> bool {
        self.log(format!("update {id} {name} {kind} {content}"));
        self.mutation_ok(name)
    }

    async fn delete_record(&self, id: &str, name: &str, kind: RecordKind) -> bool {
        self.log(format!("delete {id} {name} {kind}"));
        self.mutation_ok(name)
    }
}

/// A detector that returns fixed answers.
pub struct FakeDetector {
    pub internal: Option<Ipv4Addr>,
    pub external_v4: Option<Ipv4Addr>,
    pub external_v6: Option<Ipv6Addr>,
}

impl FakeDetector {
    /// All three slots detect an address.
    pub fn all_present() -> Self {
        Self {
            internal: Some(Ipv4Addr::new(192, 168, 1, 10)),
            external_v4: Some(Ipv4Addr::new(203, 0, 113, 5)),
            external_v6: Some("2001:db8::1".parse().unwrap()),
        }
    }

    /// No slot detects anything.
    pub fn all_absent() -> Self {
        Self {
            internal: None,
            external_v4: None,
            external_v6: None,
        }
    }
}

#[async_trait]
impl AddressDetector for FakeDetector {
    async fn internal_ipv4(&self) -> Option<Ipv4Addr> {
        self.internal
    }

    async fn external_ipv4(&self) -> Option<Ipv4Addr> {
        self.external_v4
    }

    async fn external_ipv6(&self) -> Option<Ipv6Addr> {
        self.external_v6
    }
}

/// A configuration with a distinct record name per slot.
pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("CF_API_TOKEN", "kLbs8PGjkhGWgXKDvCP1GTTHNTxiW8JJ3VdrNFeA"),
        ("CF_ZONE_ID", "023e105f4ecef8ad9ca31a8372d0c353"),
        ("HOSTNAME", "host.example.com"),
        ("INTERNAL_DOMAIN", "internal.example.com"),
        ("EXTERNAL_DOMAIN", "external.example.com"),
        ("IPV6_DOMAIN", "v6.example.com"),
    ]);

    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

//! Reconciliation engine.
//!
//! One run flows one way: detected addresses become desired facts, facts are
//! applied to the zone one at a time, and the per-fact outcomes are summed
//! into a run summary the caller maps to an exit status.
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────┐        ┌────────────┐
//! │ AddressDetector  │──────▶ │  Reconciler  │──────▶ │ ZoneClient │
//! │ (three slots)    │ facts  │ (per fact)   │ calls  │ (one zone) │
//! └──────────────────┘        └──────────────┘        └────────────┘
//!                                     │
//!                                     ▼
//!                               RunSummary
//! ```
//!
//! The slots are logically independent and target disjoint records, but they
//! run strictly sequentially: there is no shared mutable state, no locking,
//! and no concurrency inside a run.

use std::fmt;
use std::net::IpAddr;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::record::{AddressFact, RecordKind};
use crate::traits::{Action, AddressDetector, ZoneClient};

/// Result of applying one desired fact to the zone.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    /// The fact that was applied
    pub fact: AddressFact,
    /// What the zone client did for it
    pub action: Action,
}

impl OperationOutcome {
    /// Whether this operation counts toward the success tally.
    pub fn succeeded(&self) -> bool {
        self.action.succeeded()
    }
}

/// Aggregate result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Operations that succeeded
    pub succeeded: usize,
    /// Operations that were attempted
    pub attempted: usize,
}

impl RunSummary {
    /// Sum up a list of per-fact outcomes.
    pub fn from_outcomes(outcomes: &[OperationOutcome]) -> Self {
        Self {
            succeeded: outcomes.iter().filter(|o| o.succeeded()).count(),
            attempted: outcomes.len(),
        }
    }

    /// Every attempted operation succeeded, and at least one was attempted.
    pub fn all_succeeded(&self) -> bool {
        self.attempted > 0 && self.succeeded == self.attempted
    }

    /// No operation succeeded.
    pub fn none_succeeded(&self) -> bool {
        self.succeeded == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.succeeded, self.attempted)
    }
}

/// Applies desired facts to a zone, one at a time.
///
/// Facts are independent: a failure in one never blocks or short-circuits
/// the others, and every fact contributes exactly one outcome regardless of
/// which branch ran.
pub struct Reconciler<'a> {
    zone: &'a dyn ZoneClient,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over the given zone.
    pub fn new(zone: &'a dyn ZoneClient) -> Self {
        Self { zone }
    }

    /// Apply every fact in order and collect one outcome per fact.
    pub async fn apply(&self, facts: &[AddressFact]) -> Vec<OperationOutcome> {
        let mut outcomes = Vec::with_capacity(facts.len());

        for fact in facts {
            let action = self.apply_fact(fact).await;

            if action.succeeded() {
                debug!("{} ({}) reconciled: {:?}", fact.name, fact.kind, action);
            } else {
                error!("{} ({}) failed to reconcile", fact.name, fact.kind);
            }

            outcomes.push(OperationOutcome {
                fact: fact.clone(),
                action,
            });
        }

        outcomes
    }

    async fn apply_fact(&self, fact: &AddressFact) -> Action {
        match fact.address {
            Some(address) => {
                debug!("ensuring {} record for {} -> {}", fact.kind, fact.name, address);
                self.zone
                    .upsert_record(&fact.name, fact.kind, address, fact.proxied)
                    .await
            }
            None => {
                // Absence is an authoritative removal signal, not a
                // transient failure to be ignored.
                warn!(
                    "no {} address for {} - removing any existing record",
                    fact.kind, fact.name
                );
                self.zone.delete_record_if_exists(&fact.name, fact.kind).await
            }
        }
    }
}

/// Run one full detection and reconciliation pass.
///
/// Detection happens first, strictly before any zone operation. The three
/// slots are then applied in a fixed order: internal IPv4, external IPv4,
/// external IPv6.
pub async fn run_once(
    config: &Config,
    detector: &dyn AddressDetector,
    zone: &dyn ZoneClient,
) -> RunSummary {
    let internal_ipv4 = detector.internal_ipv4().await;
    let external_ipv4 = detector.external_ipv4().await;
    let external_ipv6 = detector.external_ipv6().await;

    info!(
        "detected addresses: internal v4 {:?}, external v4 {:?}, external v6 {:?}",
        internal_ipv4, external_ipv4, external_ipv6
    );

    let facts = [
        AddressFact::new(
            config.internal_record_name(),
            RecordKind::A,
            internal_ipv4.map(IpAddr::V4),
            config.proxied,
        ),
        AddressFact::new(
            config.external_record_name(),
            RecordKind::A,
            external_ipv4.map(IpAddr::V4),
            config.proxied,
        ),
        AddressFact::new(
            config.ipv6_record_name(),
            RecordKind::Aaaa,
            external_ipv6.map(IpAddr::V6),
            config.proxied,
        ),
    ];

    let outcomes = Reconciler::new(zone).apply(&facts).await;
    let summary = RunSummary::from_outcomes(&outcomes);

    info!("completed: {} records reconciled successfully", summary);
    summary
}

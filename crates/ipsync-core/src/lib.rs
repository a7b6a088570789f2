// # ipsync-core
//
// Core library for the ipsync dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the reconciliation core:
// - **AddressDetector**: Trait for detecting the host's IP addresses
// - **ZoneClient**: Trait for manipulating address records in one DNS zone
// - **Reconciler**: Applies desired address facts to the zone, one at a time
// - **run_once**: Detect, reconcile, summarize — the whole of one run
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Detection and zone transport live behind
//    traits; the reconciliation logic never touches a socket.
// 2. **Fails Closed**: Zone operations report outcomes, never faults. A
//    failure is logged where it happened and surfaces only as a failed slot
//    in the run summary.
// 3. **No Persistent State**: Every run recomputes everything from live
//    queries and is independently idempotent. Eventual retry comes from the
//    external scheduler that re-invokes the run.

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::Config;
pub use engine::{OperationOutcome, Reconciler, RunSummary, run_once};
pub use error::{Error, Result};
pub use record::{AddressFact, RecordKind, RemoteRecord};
pub use traits::{Action, AddressDetector, ZoneClient};

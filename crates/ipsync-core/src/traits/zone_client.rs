// # Zone Client Trait
//
// Defines the interface for manipulating address records in one DNS zone.
//
// ## Implementations
//
// - Cloudflare: `ipsync-provider-cloudflare` crate
//
// ## Failure policy
//
// Every operation fails closed. Implementations catch transport-level and
// provider-level errors, log them with context, and report plain booleans —
// callers never handle faults, only outcomes. No operation retries
// in-process; runs are re-invoked periodically by an external scheduler,
// which provides eventual retry.
//
// ## Why booleans and not errors?
//
// The reconciler treats every record independently and must never let one
// slot's failure abort the others. Pushing the catch-and-log down into the
// client keeps the reconciliation loop free of error plumbing and makes the
// "a failed slot is just a failed slot" contract impossible to violate by
// accident.

use async_trait::async_trait;
use std::net::IpAddr;

use crate::record::RecordKind;

/// What the zone client did for one desired fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A record was created
    Created,
    /// An existing record was rewritten
    Updated,
    /// An existing record was removed
    Deleted,
    /// Nothing to delete; counts as success
    AlreadyAbsent,
    /// The operation failed; the cause was logged where it occurred
    Failed,
}

impl Action {
    /// Whether the action counts toward the run's success tally.
    pub fn succeeded(&self) -> bool {
        !matches!(self, Action::Failed)
    }
}

/// Trait for zone client implementations
///
/// All operations are scoped to the single zone the client was constructed
/// for. Implementations must be thread-safe.
#[async_trait]
pub trait ZoneClient: Send + Sync {
    /// Find the id of the record matching `name` and `kind`.
    ///
    /// Returns the first match's id, or `None` when no record matches *or*
    /// the query itself failed. The two cases are deliberately not
    /// distinguished at this layer: callers treat absence uniformly as
    /// "nothing to update" / "nothing to delete".
    async fn find_record_id(&self, name: &str, kind: RecordKind) -> Option<String>;

    /// Create a record with the given content and a short dynamic-DNS TTL.
    ///
    /// Success is the provider's own success indicator from its response
    /// payload, not merely the HTTP status.
    async fn create_record(
        &self,
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        proxied: bool,
    ) -> bool;

    /// Rewrite an existing record, targeted by id.
    async fn update_record(
        &self,
        id: &str,
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        proxied: bool,
    ) -> bool;

    /// Remove an existing record, targeted by id.
    async fn delete_record(&self, id: &str, name: &str, kind: RecordKind) -> bool;

    /// Remove the record if it exists.
    ///
    /// An absent id — not found, or the lookup failed — is trivial success:
    /// there is nothing to delete.
    async fn delete_record_if_exists(&self, name: &str, kind: RecordKind) -> Action {
        match self.find_record_id(name, kind).await {
            Some(id) => {
                if self.delete_record(&id, name, kind).await {
                    Action::Deleted
                } else {
                    Action::Failed
                }
            }
            None => {
                tracing::debug!("no {} record found for {} to delete", kind, name);
                Action::AlreadyAbsent
            }
        }
    }

    /// Create or update: the single entry point for "this record should
    /// exist with this content".
    ///
    /// Looks the record up first so a create can never produce a duplicate
    /// of an existing (name, kind) pair.
    async fn upsert_record(
        &self,
        name: &str,
        kind: RecordKind,
        content: IpAddr,
        proxied: bool,
    ) -> Action {
        match self.find_record_id(name, kind).await {
            Some(id) => {
                if self.update_record(&id, name, kind, content, proxied).await {
                    Action::Updated
                } else {
                    Action::Failed
                }
            }
            None => {
                if self.create_record(name, kind, content, proxied).await {
                    Action::Created
                } else {
                    Action::Failed
                }
            }
        }
    }
}

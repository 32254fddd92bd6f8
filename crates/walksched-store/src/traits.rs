//! Store trait definitions

use async_trait::async_trait;

use crate::{AuditEvent, Document, DocumentWrite, StoreResult};

/// Main store trait.
///
/// Mirrors what a hosted document database offers: point reads, whole
/// document puts and atomic multi-document batches. There is no
/// compare-and-swap; callers that need conditional writes re-read first and
/// accept the race.
#[async_trait]
pub trait Store: Send + Sync {
    // Documents

    /// Read a document, `None` if it does not exist
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Create or replace a whole document
    async fn put(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()>;

    /// Apply every write or none of them.
    ///
    /// Writes have update semantics: a write addressed to a missing
    /// document fails the whole batch with `StoreError::NotFound`.
    async fn batch_write(&self, writes: Vec<DocumentWrite>) -> StoreResult<()>;

    // Audit log

    /// Append an audit event
    async fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    async fn recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;
use crate::event::AuditEvent;

/// Primary store port.
///
/// The engine doesn't enumerate or know concrete implementations.
/// For the engine, the durable store is just this trait — and every
/// `insert` error, whatever its kind, means "demote to the next tier".
pub trait AuditStore: Send + Sync {
    /// Provision the schema from the SQL file at `path`. Idempotent.
    /// Called once at bootstrap; failure aborts initialization before
    /// any worker starts.
    fn ensure_schema(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Persist one record.
    fn insert(
        &self,
        event: &AuditEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}

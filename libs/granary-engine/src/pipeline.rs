use std::io::Write;
use std::sync::Arc;

use granary_api::event::{AuditEvent, EntityKind, EventType, UserRole};
use granary_api::store::AuditStore;
use granary_api::util::now_iso_ms;

use crate::error::EngineError;
use crate::fallback::FallbackFile;
use crate::queue::RetryQueue;

/// The synchronous write path, invoked by each logging operation:
/// validate → construct → serialize → echo → primary store → fallback
/// file → retry queue.
///
/// Logging operations return `()` — a failure anywhere in the cascade is
/// surfaced on the diagnostic channel, never back into business logic.
/// Exactly one tier ends up holding each accepted record.
pub struct AuditPipeline {
    store: Arc<dyn AuditStore>,
    fallback: Arc<FallbackFile>,
    queue: Arc<RetryQueue>,
}

impl AuditPipeline {
    pub fn new(
        store: Arc<dyn AuditStore>,
        fallback: Arc<FallbackFile>,
        queue: Arc<RetryQueue>,
    ) -> Self {
        Self { store, fallback, queue }
    }

    /// Record the creation of a new entity. Carries the new state only.
    pub async fn log_create(
        &self,
        entity: EntityKind,
        username: &str,
        role: UserRole,
        context: Option<&str>,
        entity_id: &str,
        new_value: serde_json::Value,
        description: Option<&str>,
    ) {
        self.record(
            EventType::Create,
            entity,
            username,
            role,
            context,
            entity_id,
            None,
            Some(new_value),
            description,
        )
        .await;
    }

    /// Record a change to an entity. Carries both the previous and the
    /// new state.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_update(
        &self,
        entity: EntityKind,
        username: &str,
        role: UserRole,
        context: Option<&str>,
        entity_id: &str,
        old_value: serde_json::Value,
        new_value: serde_json::Value,
        description: Option<&str>,
    ) {
        self.record(
            EventType::Update,
            entity,
            username,
            role,
            context,
            entity_id,
            Some(old_value),
            Some(new_value),
            description,
        )
        .await;
    }

    /// Record the deletion of an entity. Carries neither state.
    pub async fn log_delete(
        &self,
        entity: EntityKind,
        username: &str,
        role: UserRole,
        context: Option<&str>,
        entity_id: &str,
        description: Option<&str>,
    ) {
        self.record(
            EventType::Delete,
            entity,
            username,
            role,
            context,
            entity_id,
            None,
            None,
            description,
        )
        .await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        event_type: EventType,
        entity: EntityKind,
        username: &str,
        role: UserRole,
        context: Option<&str>,
        entity_id: &str,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        description: Option<&str>,
    ) {
        // The only point where an event is dropped before construction.
        if let Err(e) = validate(username, role, context) {
            tracing::error!(
                event_type = event_type.as_str(),
                entity_id,
                error = %e,
                "event rejected, dropped"
            );
            return;
        }

        let event = AuditEvent {
            timestamp: now_iso_ms(),
            event_type,
            entity,
            username: username.to_string(),
            user_role: role,
            context: context.map(str::to_string),
            entity_id: entity_id.to_string(),
            old_value,
            new_value,
            description: description.map(str::to_string),
        };

        // A record that cannot be serialized cannot be retried in any
        // tier either — dropped, not demoted.
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(entity_id, error = %e, "serialize failed, event dropped");
                return;
            }
        };

        echo(&line);

        match self.store.insert(&event).await {
            Ok(()) => return,
            Err(e) => {
                tracing::warn!(entity_id, error = %e, "store insert failed, demoting to fallback file");
            }
        }

        match self.fallback.append(&line).await {
            Ok(()) => {
                tracing::info!(entity_id, "event written to fallback file");
                return;
            }
            Err(e) => {
                tracing::warn!(entity_id, error = %e, "fallback append failed, demoting to retry queue");
            }
        }

        self.queue.push(event).await;
        tracing::info!(entity_id, "event buffered in retry queue");
    }
}

/// Best-effort console echo of the serialized record. Never aborts the
/// pipeline.
fn echo(line: &str) {
    let _ = writeln!(std::io::stdout().lock(), "{line}");
}

/// Role/context rules: an SA operates outside any business context, a CA
/// is always bound to one. The username is required.
pub(crate) fn validate(
    username: &str,
    role: UserRole,
    context: Option<&str>,
) -> Result<(), EngineError> {
    if username.is_empty() {
        return Err(EngineError::Validation("username must not be empty".into()));
    }
    match role {
        UserRole::Sa if context.is_some_and(|c| !c.is_empty()) => Err(EngineError::Validation(
            "SA events cannot carry a context".into(),
        )),
        UserRole::Ca if context.is_none_or(str::is_empty) => Err(EngineError::Validation(
            "CA events must carry a context".into(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sa_with_context_is_rejected() {
        assert!(validate("admin", UserRole::Sa, Some("ctx")).is_err());
    }

    #[test]
    fn sa_without_context_passes() {
        assert!(validate("admin", UserRole::Sa, None).is_ok());
        assert!(validate("admin", UserRole::Sa, Some("")).is_ok());
    }

    #[test]
    fn ca_without_context_is_rejected() {
        assert!(validate("ca_user", UserRole::Ca, None).is_err());
        assert!(validate("ca_user", UserRole::Ca, Some("")).is_err());
    }

    #[test]
    fn ca_with_context_passes() {
        assert!(validate("ca_user", UserRole::Ca, Some("ctx")).is_ok());
    }

    #[test]
    fn empty_username_is_rejected() {
        assert!(validate("", UserRole::Sa, None).is_err());
    }
}

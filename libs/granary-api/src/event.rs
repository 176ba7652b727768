use serde::{Deserialize, Serialize};

/// Kind of business operation being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "CREATE")]
    Create,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Create => "CREATE",
            EventType::Update => "UPDATE",
            EventType::Delete => "DELETE",
        }
    }
}

/// Role of the user performing the action.
///
/// The role constrains the `context` field of the event: an SA operates
/// outside any business context, a CA is always bound to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    /// System administrator.
    #[serde(rename = "SA")]
    Sa,
    /// Client administrator.
    #[serde(rename = "CA")]
    Ca,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Sa => "SA",
            UserRole::Ca => "CA",
        }
    }
}

/// Kind of business entity being modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Context,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Context => "context",
        }
    }
}

/// One audit record — the unit of persistence.
///
/// Constructed by the pipeline (never by callers) and immutable from then
/// on: drain workers move a record between tiers, they never modify it.
///
/// Wire shape (one JSON object per line, optional fields omitted when
/// absent):
/// `{timestamp, event_type, entity, username, user_role, context?,
///   entity_id, old_value?, new_value?, description?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// ISO-8601 instant with millisecond precision, stamped at creation.
    pub timestamp: String,
    pub event_type: EventType,
    pub entity: EntityKind,
    /// Who performed the action. Required, non-empty.
    pub username: String,
    pub user_role: UserRole,
    /// Scoping context. Present iff the role requires it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Unique identifier of the affected entity instance.
    pub entity_id: String,
    /// Previous state. Set for UPDATE only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<serde_json::Value>,
    /// New state. Set for CREATE and UPDATE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuditEvent {
        AuditEvent {
            timestamp: "2026-08-07T12:00:00.123Z".into(),
            event_type: EventType::Update,
            entity: EntityKind::Context,
            username: "ca_user".into(),
            user_role: UserRole::Ca,
            context: Some("test_ctx".into()),
            entity_id: "ctx-42".into(),
            old_value: Some(serde_json::json!({"name": "old"})),
            new_value: Some(serde_json::json!({"name": "new"})),
            description: None,
        }
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let event = sample();
        let line = serde_json::to_string(&event).unwrap();
        let back: AuditEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn absent_optionals_are_omitted_not_null() {
        let event = AuditEvent {
            timestamp: "2026-08-07T12:00:00.123Z".into(),
            event_type: EventType::Delete,
            entity: EntityKind::User,
            username: "admin".into(),
            user_role: UserRole::Sa,
            context: None,
            entity_id: "u1".into(),
            old_value: None,
            new_value: None,
            description: None,
        };
        let line = serde_json::to_string(&event).unwrap();
        assert!(!line.contains("context"));
        assert!(!line.contains("old_value"));
        assert!(!line.contains("new_value"));
        assert!(!line.contains("description"));
        assert!(!line.contains("null"));
    }

    #[test]
    fn enum_spellings_match_wire_format() {
        let line = serde_json::to_string(&sample()).unwrap();
        assert!(line.contains(r#""event_type":"UPDATE""#));
        assert!(line.contains(r#""entity":"context""#));
        assert!(line.contains(r#""user_role":"CA""#));
    }
}

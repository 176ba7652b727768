use tokio::sync::Mutex;

use granary_api::event::AuditEvent;

use crate::error::EngineError;
use crate::fallback::FallbackFile;

/// Last-resort in-process tier: an ordered buffer of records that could
/// not be written to the fallback file. A record survives here only in
/// memory until the queue drain worker lands it on disk, or the process
/// exits with it still queued (accepted data-loss risk).
///
/// All read-modify-write goes through one async lock — the queue is
/// touched from the pipeline (push) and from the drain worker (flush)
/// concurrently.
pub struct RetryQueue {
    entries: Mutex<Vec<AuditEvent>>,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub async fn push(&self, event: AuditEvent) {
        self.entries.lock().await.push(event);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Flush every queued entry into the fallback file, in insertion
    /// order. Returns the number of entries appended.
    ///
    /// The queue is cleared only once the whole batch has been appended.
    /// On a partial failure the already-appended prefix is removed and
    /// the remainder is kept for the next tick — no entry is ever
    /// appended twice, and none is lost.
    pub async fn flush_into(&self, fallback: &FallbackFile) -> Result<usize, EngineError> {
        let mut entries = self.entries.lock().await;
        if entries.is_empty() {
            return Ok(0);
        }

        let mut appended = 0;
        for event in entries.iter() {
            let line = match serde_json::to_string(event) {
                Ok(line) => line,
                Err(e) => {
                    entries.drain(..appended);
                    return Err(EngineError::Serialize(e));
                }
            };
            if let Err(e) = fallback.append(&line).await {
                entries.drain(..appended);
                return Err(e);
            }
            appended += 1;
        }

        entries.clear();
        Ok(appended)
    }
}

impl Default for RetryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use granary_api::event::{EntityKind, EventType, UserRole};

    fn event(id: &str) -> AuditEvent {
        AuditEvent {
            timestamp: "2026-08-07T12:00:00.000Z".into(),
            event_type: EventType::Create,
            entity: EntityKind::User,
            username: "admin".into(),
            user_role: UserRole::Sa,
            context: None,
            entity_id: id.into(),
            old_value: None,
            new_value: Some(serde_json::json!({"id": id})),
            description: None,
        }
    }

    #[tokio::test]
    async fn flush_preserves_order_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = FallbackFile::create(dir.path().join("fb.jsonl")).unwrap();
        let queue = RetryQueue::new();
        queue.push(event("a")).await;
        queue.push(event("b")).await;

        let flushed = queue.flush_into(&fallback).await.unwrap();
        assert_eq!(flushed, 2);
        assert!(queue.is_empty().await);

        let content = std::fs::read_to_string(fallback.path()).unwrap();
        let ids: Vec<String> = content
            .lines()
            .map(|l| serde_json::from_str::<AuditEvent>(l).unwrap().entity_id)
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn failed_flush_keeps_queue_and_never_doubles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fb.jsonl");
        let fallback = FallbackFile::create(&path).unwrap();
        let queue = RetryQueue::new();
        queue.push(event("a")).await;
        queue.push(event("b")).await;

        // Turn the file path into a directory so appends fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(queue.flush_into(&fallback).await.is_err());
        assert_eq!(queue.len().await, 2);

        // Restore writability: the retried flush appends each entry once.
        std::fs::remove_dir(&path).unwrap();
        assert_eq!(queue.flush_into(&fallback).await.unwrap(), 2);
        assert!(queue.is_empty().await);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn flush_of_empty_queue_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = FallbackFile::create(dir.path().join("fb.jsonl")).unwrap();
        let queue = RetryQueue::new();
        assert_eq!(queue.flush_into(&fallback).await.unwrap(), 0);
    }
}

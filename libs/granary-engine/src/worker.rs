use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use granary_api::store::AuditStore;

use crate::fallback::FallbackFile;
use crate::queue::RetryQueue;

/// Spawn the file drain worker: on every tick, replay the fallback file
/// into the primary store. On shutdown it runs one final pass before
/// terminating.
pub(crate) fn spawn_file_drain(
    store: Arc<dyn AuditStore>,
    fallback: Arc<FallbackFile>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    file_pass(&*store, &fallback).await;
                }
                _ = token.cancelled() => {
                    file_pass(&*store, &fallback).await;
                    break;
                }
            }
        }
        tracing::info!(worker = "file-drain", "stopped");
    })
}

/// Spawn the queue drain worker: on every tick, flush the retry queue
/// into the fallback file. On shutdown it runs one final pass before
/// terminating.
pub(crate) fn spawn_queue_drain(
    queue: Arc<RetryQueue>,
    fallback: Arc<FallbackFile>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    queue_pass(&queue, &fallback).await;
                }
                _ = token.cancelled() => {
                    queue_pass(&queue, &fallback).await;
                    break;
                }
            }
        }
        tracing::info!(worker = "queue-drain", "stopped");
    })
}

async fn file_pass(store: &dyn AuditStore, fallback: &FallbackFile) {
    match fallback.drain_into(store).await {
        Ok(0) => {}
        Ok(drained) => {
            tracing::info!(worker = "file-drain", drained, "fallback file drained to store");
        }
        Err(e) => {
            // Remaining lines stay in place for the next tick.
            tracing::error!(worker = "file-drain", error = %e, "drain pass aborted");
        }
    }
}

async fn queue_pass(queue: &RetryQueue, fallback: &FallbackFile) {
    match queue.flush_into(fallback).await {
        Ok(0) => {}
        Ok(flushed) => {
            tracing::info!(worker = "queue-drain", flushed, "retry queue flushed to fallback file");
        }
        Err(e) => {
            // Unflushed entries stay queued for the next tick.
            tracing::error!(worker = "queue-drain", error = %e, "flush pass aborted");
        }
    }
}

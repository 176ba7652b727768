use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use granary_api::store::AuditStore;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fallback::FallbackFile;
use crate::pipeline::AuditPipeline;
use crate::queue::RetryQueue;
use crate::worker;

/// Join handle of one background drain worker.
struct WorkerSlot {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// The running audit engine — owns the pipeline tiers, both drain
/// workers, and the shutdown signal.
pub struct Engine {
    pipeline: Arc<AuditPipeline>,
    workers: Vec<WorkerSlot>,
    token: CancellationToken,
}

impl Engine {
    /// Bootstrap the engine: provision the store schema, open the
    /// fallback file, spawn both drain workers.
    ///
    /// A provisioning or fallback-file failure is fatal — no worker
    /// starts and no event can be recorded against an unprovisioned
    /// store.
    pub async fn bootstrap(
        store: Arc<dyn AuditStore>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        store
            .ensure_schema(&config.schema_path)
            .await
            .map_err(|e| EngineError::Store(e.with_context("schema provisioning")))?;

        let fallback = Arc::new(FallbackFile::create(&config.fallback_path)?);
        let queue = Arc::new(RetryQueue::new());
        let pipeline = Arc::new(AuditPipeline::new(
            store.clone(),
            fallback.clone(),
            queue.clone(),
        ));

        // One token, observed by both workers: stop is a broadcast, not
        // a message consumed by a single waiter.
        let token = CancellationToken::new();
        let workers = vec![
            WorkerSlot {
                name: "file-drain",
                handle: worker::spawn_file_drain(
                    store,
                    fallback.clone(),
                    Duration::from_millis(config.file_drain_interval_ms),
                    token.clone(),
                ),
            },
            WorkerSlot {
                name: "queue-drain",
                handle: worker::spawn_queue_drain(
                    queue,
                    fallback,
                    Duration::from_millis(config.queue_drain_interval_ms),
                    token.clone(),
                ),
            },
        ];

        tracing::info!(
            fallback = %config.fallback_path,
            file_interval_ms = config.file_drain_interval_ms,
            queue_interval_ms = config.queue_drain_interval_ms,
            "audit engine started"
        );

        Ok(Engine { pipeline, workers, token })
    }

    /// Shared handle for callers emitting events.
    pub fn pipeline(&self) -> Arc<AuditPipeline> {
        self.pipeline.clone()
    }

    /// Graceful shutdown: broadcast the stop signal and wait for both
    /// workers to finish their final drain pass. Returns only once no
    /// in-flight fallback data can be abandoned mid-drain.
    pub async fn shutdown(self) {
        self.token.cancel();
        for slot in self.workers {
            if slot.handle.await.is_err() {
                tracing::error!(worker = slot.name, "worker task panicked");
            }
        }
        tracing::info!("audit engine shut down");
    }
}

//! The single consumer of the task queue.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use cordstore_shared::{ChannelId, StorageConfig};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::processor::{FileTaskProcessor, StorageDispatcher, TaskProcessor};
use super::task::StorageTask;
use super::task_queue::TaskReceiver;
use crate::catalog::ObjectCatalog;
use crate::channel::{ChannelClient, ChannelIdentity};
use crate::storage::{StorageError, StorageResult};

/// Drains the task queue one task at a time.
///
/// Every dequeued task has its completion resolved exactly once, including when
/// the processor panics or returns without resolving it.
pub struct StorageWorker<P: TaskProcessor> {
    processor: P,
}

impl<C: ChannelClient, K: ObjectCatalog> StorageWorker<StorageDispatcher<C, K>> {
    /// Create a worker that stores objects in `channel_id` and records them in `catalog`.
    #[must_use]
    pub fn new(
        channel: Arc<C>,
        catalog: Arc<K>,
        channel_id: ChannelId,
        config: StorageConfig,
    ) -> Self {
        Self::with_processor(StorageDispatcher::new(FileTaskProcessor::new(
            channel, catalog, channel_id, config,
        )))
    }
}

impl<P: TaskProcessor> StorageWorker<P> {
    /// Create a worker around any processor.
    #[must_use]
    pub fn with_processor(processor: P) -> Self {
        Self { processor }
    }

    /// Process tasks until `token` is cancelled or every producer is gone.
    ///
    /// Cancellation is observed between tasks; a task in progress runs to the
    /// end. Tasks still queued when the loop stops are resolved as cancelled.
    /// Returns the number of processed tasks.
    pub async fn run(&self, mut receiver: TaskReceiver, token: CancellationToken) -> usize {
        info!("Storage worker started");

        let mut processed = 0;
        while let Some(task) = receiver.dequeue(&token).await {
            self.handle(task).await;
            processed += 1;
        }

        let cancelled = receiver.shutdown();
        info!(processed, cancelled, "Storage worker stopped");
        processed
    }

    async fn handle(&self, task: StorageTask) {
        let StorageTask {
            path,
            kind,
            mut completion,
        } = task;
        let label = kind.to_string();
        debug!(path = %path, kind = %label, "Processing storage task");
        let started = Instant::now();

        let outcome = AssertUnwindSafe(self.processor.process(&path, kind, &mut completion))
            .catch_unwind()
            .await;

        if let Err(payload) = outcome {
            let reason = panic_message(payload.as_ref());
            error!(path = %path, kind = %label, reason = %reason, "Storage task panicked");
            completion.resolve(Err(StorageError::internal(format!(
                "unhandled fault while processing {label} of {path}: {reason}"
            ))));
        }

        if !completion.is_resolved() {
            warn!(path = %path, kind = %label, "Storage task finished without a result");
            completion.resolve(Err(StorageError::internal(format!(
                "{label} of {path} finished without a result"
            ))));
        }

        debug!(
            path = %path,
            kind = %label,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Storage task done"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Check the channel client is authenticated and log who it is.
///
/// # Errors
///
/// Returns an internal error if the channel cannot identify the client.
pub async fn verify_channel<C: ChannelClient>(channel: &C) -> StorageResult<ChannelIdentity> {
    let identity = channel.current_identity().await.map_err(|e| {
        error!(error = %e, "Failed to identify channel client");
        StorageError::internal_caused_by("failed to identify channel client", e)
    })?;
    info!(identity = %identity, "Connected to channel");
    Ok(identity)
}

//! Unbounded FIFO of storage tasks with a single consumer.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::completion::{Completion, TaskHandle};
use super::task::{StorageTask, TaskKind};
use crate::storage::StorageError;

/// Create a connected queue and receiver.
///
/// The queue handle can be cloned freely; the receiver is meant for exactly one
/// worker.
pub fn storage_task_queue() -> (StorageTaskQueue, TaskReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (StorageTaskQueue { sender }, TaskReceiver { receiver })
}

/// Producer side of the task queue.
///
/// The queue is unbounded: producers are never backpressured.
#[derive(Debug, Clone)]
pub struct StorageTaskQueue {
    sender: mpsc::UnboundedSender<StorageTask>,
}

impl StorageTaskQueue {
    /// Queue a task and return the handle its result arrives on.
    ///
    /// If the worker is gone the handle resolves to a cancellation error.
    pub fn enqueue(&self, path: impl Into<String>, kind: TaskKind) -> TaskHandle {
        let (completion, handle) = Completion::new();
        let task = StorageTask {
            path: path.into(),
            kind,
            completion,
        };
        debug!(path = %task.path, kind = %task.kind, "Enqueuing storage task");

        if let Err(mpsc::error::SendError(task)) = self.sender.send(task) {
            warn!(path = %task.path, kind = %task.kind, "Task queue is closed, cancelling task");
        }
        handle
    }

    /// Whether the receiving side has shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer side of the task queue.
#[derive(Debug)]
pub struct TaskReceiver {
    receiver: mpsc::UnboundedReceiver<StorageTask>,
}

impl TaskReceiver {
    /// Wait for the next task.
    ///
    /// Returns `None` once `token` is cancelled or every producer is gone.
    pub async fn dequeue(&mut self, token: &CancellationToken) -> Option<StorageTask> {
        tokio::select! {
            biased;
            () = token.cancelled() => None,
            task = self.receiver.recv() => task,
        }
    }

    /// Number of tasks waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no task is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Stop accepting tasks and cancel every task still waiting.
    ///
    /// Returns the number of cancelled tasks.
    pub fn shutdown(mut self) -> usize {
        self.receiver.close();
        let mut cancelled = 0;
        while let Ok(mut task) = self.receiver.try_recv() {
            task.completion.resolve(Err(StorageError::Cancelled(format!(
                "{} of {} cancelled by shutdown",
                task.kind, task.path
            ))));
            cancelled += 1;
        }
        cancelled
    }
}

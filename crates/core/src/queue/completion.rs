//! Single-assignment result cell shared by a task and its caller.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::task::TaskResult;
use crate::storage::StorageError;

/// Worker side of a task's result cell.
///
/// Resolving consumes the cell; later attempts are ignored. Dropping an
/// unresolved cell cancels the task for the caller.
#[derive(Debug)]
pub struct Completion {
    sender: Option<oneshot::Sender<TaskResult>>,
}

/// Caller side of a task's result cell.
///
/// Resolves to the task's result, or to [`StorageError::Cancelled`] if the task
/// was dropped before it was processed.
#[derive(Debug)]
#[must_use = "a task handle does nothing unless awaited"]
pub struct TaskHandle {
    receiver: oneshot::Receiver<TaskResult>,
}

impl Completion {
    /// Create a connected cell and handle.
    pub(crate) fn new() -> (Self, TaskHandle) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Some(sender),
            },
            TaskHandle { receiver },
        )
    }

    /// Store the result. Returns `false` if the cell was already resolved.
    ///
    /// A caller that stopped waiting does not count as a failure.
    pub fn resolve(&mut self, result: TaskResult) -> bool {
        match self.sender.take() {
            Some(sender) => {
                // The caller may have given up on the handle.
                let _ = sender.send(result);
                true
            }
            None => false,
        }
    }

    /// Whether a result has been stored.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.sender.is_none()
    }
}

impl Future for TaskHandle {
    type Output = TaskResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(StorageError::Cancelled(
                    "task was dropped before it was processed".to_string(),
                ))
            })
        })
    }
}

//! Single-consumer task queue that serializes storage operations.
//!
//! Callers enqueue a [`TaskKind`] and get a [`TaskHandle`] back. One
//! [`StorageWorker`] drains the queue in order, runs each task to the end and
//! resolves its handle exactly once.

mod completion;
mod processor;
mod task;
mod task_queue;
mod worker;

pub use completion::{Completion, TaskHandle};
pub use processor::{FileTaskProcessor, FolderTaskProcessor, StorageDispatcher, TaskProcessor};
pub use task::{
    FileOperation, FolderOperation, OperationKind, StorageTask, TaskKind, TaskOutput, TaskResult,
    TaskTarget,
};
pub use task_queue::{StorageTaskQueue, TaskReceiver, storage_task_queue};
pub use worker::{StorageWorker, verify_channel};

//! Task handlers: file tasks go through the storage engine and the catalog,
//! folder tasks are not supported yet.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use cordstore_shared::{ChannelId, ObjectId, StorageConfig};
use tracing::{error, info, warn};

use super::completion::Completion;
use super::task::{FileOperation, FolderOperation, TaskKind, TaskOutput, TaskResult};
use crate::catalog::{CatalogError, ObjectCatalog, ObjectRecord};
use crate::channel::ChannelClient;
use crate::storage::{Deleter, Downloader, StorageError, Uploader};

/// Handles dequeued tasks for the worker.
///
/// Implementations are expected to resolve `completion`; the worker resolves it
/// with an error if they do not.
pub trait TaskProcessor: Send + Sync {
    /// Process one task.
    fn process(
        &self,
        path: &str,
        kind: TaskKind,
        completion: &mut Completion,
    ) -> impl Future<Output = ()> + Send;
}

/// Runs file operations against the channel and the catalog.
pub struct FileTaskProcessor<C: ChannelClient, K: ObjectCatalog> {
    uploader: Uploader<C>,
    downloader: Downloader<C>,
    deleter: Deleter<C>,
    catalog: Arc<K>,
}

impl<C: ChannelClient, K: ObjectCatalog> FileTaskProcessor<C, K> {
    /// Create a file processor.
    #[must_use]
    pub fn new(
        channel: Arc<C>,
        catalog: Arc<K>,
        channel_id: ChannelId,
        config: StorageConfig,
    ) -> Self {
        Self {
            uploader: Uploader::new(Arc::clone(&channel), channel_id, config),
            downloader: Downloader::new(Arc::clone(&channel), channel_id),
            deleter: Deleter::new(channel, channel_id),
            catalog,
        }
    }

    /// Run a file operation and resolve its completion.
    pub async fn process(&self, path: &str, operation: FileOperation, completion: &mut Completion) {
        let result = match operation {
            FileOperation::Upload {
                object_id,
                name,
                content,
            } => self.upload(object_id, &name, content).await,
            FileOperation::Read { object_id } => self.read(object_id).await,
            FileOperation::Delete { object_id } => self.delete(object_id).await,
        };

        if let Err(e) = &result {
            error!(path, error = %e, kind = %e.kind(), "File task failed");
        }
        completion.resolve(result);
    }

    async fn upload(&self, object_id: ObjectId, name: &str, content: Bytes) -> TaskResult {
        match self.catalog.resolve_message_ids(object_id).await {
            Ok(_) => return Err(CatalogError::DuplicateId(object_id).into()),
            Err(CatalogError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        if self.catalog.find_by_name(name).await?.is_some() {
            return Err(StorageError::validation(format!(
                "an object named '{name}' already exists"
            )));
        }

        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        let message_ids = self.uploader.upload(content, name).await?;

        let record = ObjectRecord::new(object_id, name, size, message_ids.clone());
        if let Err(e) = self.catalog.persist_message_ids(record).await {
            error!(
                object_id = %object_id,
                error = %e,
                "Failed to record uploaded object, removing its messages"
            );
            if let Err(cleanup) = self.deleter.delete(&message_ids).await {
                warn!(
                    object_id = %object_id,
                    error = %cleanup,
                    "Failed to remove messages of unrecorded object"
                );
            }
            return Err(e.into());
        }

        info!(object_id = %object_id, name, messages = message_ids.len(), "Object stored");
        Ok(TaskOutput::Stored {
            object_id,
            message_ids,
        })
    }

    async fn read(&self, object_id: ObjectId) -> TaskResult {
        let message_ids = self.catalog.resolve_message_ids(object_id).await?;
        let object = self.downloader.download(&message_ids).await?;
        Ok(TaskOutput::Retrieved(object))
    }

    async fn delete(&self, object_id: ObjectId) -> TaskResult {
        let message_ids = self.catalog.resolve_message_ids(object_id).await?;

        match self.deleter.delete(&message_ids).await {
            Ok(summary) => {
                self.catalog.remove_object(object_id).await?;
                info!(object_id = %object_id, deleted = summary.deleted, "Object removed");
                Ok(TaskOutput::Removed { object_id, summary })
            }
            Err(e) => {
                if e.partially_deleted() {
                    warn!(object_id = %object_id, "Object partially deleted, marking it corrupted");
                    if let Err(mark) = self.catalog.mark_corrupted(object_id).await {
                        error!(
                            object_id = %object_id,
                            error = %mark,
                            "Failed to mark object corrupted"
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

/// Handles folder operations. None are supported yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct FolderTaskProcessor;

impl FolderTaskProcessor {
    /// Resolve the completion with a not-implemented error.
    pub fn process(&self, path: &str, operation: FolderOperation, completion: &mut Completion) {
        let what = match operation {
            FolderOperation::Read => "reading folders",
            FolderOperation::Create => "creating folders",
            FolderOperation::Delete => "deleting folders",
        };
        warn!(path, "Folder operation requested: {what} is not implemented");
        completion.resolve(Err(StorageError::NotImplemented(format!(
            "{what} is not implemented"
        ))));
    }
}

/// Routes tasks to the file or folder processor.
pub struct StorageDispatcher<C: ChannelClient, K: ObjectCatalog> {
    files: FileTaskProcessor<C, K>,
    folders: FolderTaskProcessor,
}

impl<C: ChannelClient, K: ObjectCatalog> StorageDispatcher<C, K> {
    /// Create a dispatcher over a file processor.
    #[must_use]
    pub fn new(files: FileTaskProcessor<C, K>) -> Self {
        Self {
            files,
            folders: FolderTaskProcessor,
        }
    }
}

impl<C: ChannelClient, K: ObjectCatalog> TaskProcessor for StorageDispatcher<C, K> {
    async fn process(&self, path: &str, kind: TaskKind, completion: &mut Completion) {
        match kind {
            TaskKind::File(operation) => self.files.process(path, operation, completion).await,
            TaskKind::Folder(operation) => self.folders.process(path, operation, completion),
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;

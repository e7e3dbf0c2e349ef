//! Caller-facing storage API.
//!
//! Every call becomes a task on the queue and waits for the worker to finish it,
//! so concurrent callers are served strictly in the order they called.

use bytes::Bytes;
use cordstore_shared::{MessageId, ObjectId};
use tracing::instrument;

use crate::queue::{FileOperation, FolderOperation, StorageTaskQueue, TaskKind, TaskOutput};
use crate::storage::{DeletionSummary, StorageError, StorageResult, StoredObject};

/// Handle for queueing storage operations.
#[derive(Debug, Clone)]
pub struct StorageService {
    queue: StorageTaskQueue,
}

impl StorageService {
    /// Create a service over a task queue.
    #[must_use]
    pub fn new(queue: StorageTaskQueue) -> Self {
        Self { queue }
    }

    /// Store `content` as `name` under folder `path`.
    ///
    /// Returns the new object's id and its message ids in chunk order.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload_file(
        &self,
        path: &str,
        name: &str,
        content: Bytes,
    ) -> StorageResult<(ObjectId, Vec<MessageId>)> {
        let object_id = ObjectId::new();
        let kind = TaskKind::File(FileOperation::Upload {
            object_id,
            name: name.to_string(),
            content,
        });
        match self.queue.enqueue(path, kind).await? {
            TaskOutput::Stored {
                object_id,
                message_ids,
            } => Ok((object_id, message_ids)),
            other => Err(unexpected(&other)),
        }
    }

    /// Read an object back.
    #[instrument(skip(self))]
    pub async fn get_file(&self, object_id: ObjectId) -> StorageResult<StoredObject> {
        let kind = TaskKind::File(FileOperation::Read { object_id });
        match self.queue.enqueue(object_id.to_string(), kind).await? {
            TaskOutput::Retrieved(object) => Ok(object),
            other => Err(unexpected(&other)),
        }
    }

    /// Delete an object.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, object_id: ObjectId) -> StorageResult<DeletionSummary> {
        let kind = TaskKind::File(FileOperation::Delete { object_id });
        match self.queue.enqueue(object_id.to_string(), kind).await? {
            TaskOutput::Removed { summary, .. } => Ok(summary),
            other => Err(unexpected(&other)),
        }
    }

    /// Create a folder.
    pub async fn create_folder(&self, path: &str) -> StorageResult<()> {
        self.folder(path, FolderOperation::Create).await
    }

    /// Delete a folder.
    pub async fn delete_folder(&self, path: &str) -> StorageResult<()> {
        self.folder(path, FolderOperation::Delete).await
    }

    /// List a folder.
    pub async fn get_folder(&self, path: &str) -> StorageResult<()> {
        self.folder(path, FolderOperation::Read).await
    }

    async fn folder(&self, path: &str, operation: FolderOperation) -> StorageResult<()> {
        let output = self.queue.enqueue(path, TaskKind::Folder(operation)).await?;
        Err(unexpected(&output))
    }
}

fn unexpected(output: &TaskOutput) -> StorageError {
    StorageError::internal(format!("unexpected task output: {output:?}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cordstore_shared::{ChannelId, ErrorKind, StorageConfig};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::queue::{StorageWorker, storage_task_queue};
    use crate::testing::MockChannel;

    struct Harness {
        service: StorageService,
        channel: Arc<MockChannel>,
        token: CancellationToken,
    }

    fn start() -> Harness {
        let channel = Arc::new(MockChannel::new());
        let (queue, receiver) = storage_task_queue();
        let worker = StorageWorker::new(
            Arc::clone(&channel),
            Arc::new(InMemoryCatalog::new()),
            ChannelId(9),
            StorageConfig::default()
                .with_max_chunk_size(3)
                .with_max_attachments_per_message(2),
        );
        let token = CancellationToken::new();
        let worker_token = token.clone();
        tokio::spawn(async move { worker.run(receiver, worker_token).await });
        Harness {
            service: StorageService::new(queue),
            channel,
            token,
        }
    }

    #[tokio::test]
    async fn test_upload_get_delete() {
        let h = start();

        let (object_id, message_ids) = h
            .service
            .upload_file("/", "hello.txt", Bytes::from_static(b"hello, world"))
            .await
            .unwrap();
        assert_eq!(message_ids.len(), 2);

        let object = h.service.get_file(object_id).await.unwrap();
        assert_eq!(object.name, "hello.txt");
        assert_eq!(object.content, Bytes::from_static(b"hello, world"));

        let summary = h.service.delete_file(object_id).await.unwrap();
        assert_eq!(summary.deleted, 2);
        assert_eq!(h.channel.message_count(), 0);

        let err = h.service.get_file(object_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        h.token.cancel();
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_all_served() {
        let h = start();
        let service = h.service.clone();

        let uploads = (0..5).map(|i| {
            let service = service.clone();
            async move {
                service
                    .upload_file("/", &format!("file-{i}.bin"), Bytes::from(vec![i; 7]))
                    .await
            }
        });
        let results = futures::future::join_all(uploads).await;

        for (i, result) in results.into_iter().enumerate() {
            let (object_id, _) = result.unwrap();
            let object = h.service.get_file(object_id).await.unwrap();
            assert_eq!(object.name, format!("file-{i}.bin"));
            assert_eq!(object.content.len(), 7);
        }
        h.token.cancel();
    }

    #[tokio::test]
    async fn test_folder_operations_report_not_implemented() {
        let h = start();

        for result in [
            h.service.create_folder("/a").await,
            h.service.get_folder("/a").await,
            h.service.delete_folder("/a").await,
        ] {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::NotImplemented);
        }
        h.token.cancel();
    }

    #[tokio::test]
    async fn test_calls_fail_once_worker_is_gone() {
        let h = start();
        h.token.cancel();
        tokio::task::yield_now().await;

        let err = loop {
            match h.service.create_folder("/a").await {
                Err(e) if e.kind() == ErrorKind::Cancelled => break e,
                _ => tokio::task::yield_now().await,
            }
        };
        assert!(matches!(err, StorageError::Cancelled(_)));
    }
}

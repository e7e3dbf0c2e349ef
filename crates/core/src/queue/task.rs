//! Task model: what a caller asks for and what it gets back.

use std::fmt;

use bytes::Bytes;
use cordstore_shared::{MessageId, ObjectId};

use super::completion::Completion;
use crate::storage::{DeletionSummary, StorageError, StoredObject};

/// Result delivered through a task's completion.
pub type TaskResult = Result<TaskOutput, StorageError>;

/// Operation on a single object.
#[derive(Debug, Clone)]
pub enum FileOperation {
    /// Read an object back.
    Read {
        /// Object to read.
        object_id: ObjectId,
    },
    /// Store a new object under an id chosen by the caller.
    Upload {
        /// Id the object is recorded under.
        object_id: ObjectId,
        /// Object name.
        name: String,
        /// Object bytes.
        content: Bytes,
    },
    /// Delete an object.
    Delete {
        /// Object to delete.
        object_id: ObjectId,
    },
}

/// Operation on a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderOperation {
    /// List a folder.
    Read,
    /// Create a folder.
    Create,
    /// Delete a folder.
    Delete,
}

/// What a task does.
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Object operation.
    File(FileOperation),
    /// Folder operation.
    Folder(FolderOperation),
}

/// Operation class, independent of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read or list.
    Read,
    /// Upload or create.
    Upload,
    /// Delete.
    Delete,
}

/// What a task operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTarget {
    /// A single object.
    File,
    /// A folder.
    Folder,
}

impl TaskKind {
    /// Operation class of the task.
    #[must_use]
    pub fn operation(&self) -> OperationKind {
        match self {
            Self::File(FileOperation::Read { .. }) | Self::Folder(FolderOperation::Read) => {
                OperationKind::Read
            }
            Self::File(FileOperation::Upload { .. }) | Self::Folder(FolderOperation::Create) => {
                OperationKind::Upload
            }
            Self::File(FileOperation::Delete { .. }) | Self::Folder(FolderOperation::Delete) => {
                OperationKind::Delete
            }
        }
    }

    /// Target of the task.
    #[must_use]
    pub fn target(&self) -> TaskTarget {
        match self {
            Self::File(_) => TaskTarget::File,
            Self::Folder(_) => TaskTarget::Folder,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target() {
            TaskTarget::File => "file",
            TaskTarget::Folder => "folder",
        };
        let operation = match self.operation() {
            OperationKind::Read => "read",
            OperationKind::Upload => "upload",
            OperationKind::Delete => "delete",
        };
        write!(f, "{target} {operation}")
    }
}

/// Successful outcome of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    /// The object was stored.
    Stored {
        /// Id the object is recorded under.
        object_id: ObjectId,
        /// Message ids in chunk order.
        message_ids: Vec<MessageId>,
    },
    /// The object was read back.
    Retrieved(StoredObject),
    /// The object was deleted.
    Removed {
        /// Deleted object.
        object_id: ObjectId,
        /// What the deletion did.
        summary: DeletionSummary,
    },
}

/// A queued unit of work plus its completion.
///
/// Consumed exactly once by the worker.
#[derive(Debug)]
pub struct StorageTask {
    /// Path or target identifier the caller addressed.
    pub path: String,
    /// What to do.
    pub kind: TaskKind,
    /// Where the result goes.
    pub completion: Completion,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(TaskKind::File(FileOperation::Read { object_id: ObjectId::new() }), "file read")]
    #[case(
        TaskKind::File(FileOperation::Upload {
            object_id: ObjectId::new(),
            name: "a".into(),
            content: Bytes::new(),
        }),
        "file upload"
    )]
    #[case(TaskKind::File(FileOperation::Delete { object_id: ObjectId::new() }), "file delete")]
    #[case(TaskKind::Folder(FolderOperation::Read), "folder read")]
    #[case(TaskKind::Folder(FolderOperation::Create), "folder upload")]
    #[case(TaskKind::Folder(FolderOperation::Delete), "folder delete")]
    fn test_task_kind_display(#[case] kind: TaskKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
    }

    #[test]
    fn test_task_kind_classification() {
        let kind = TaskKind::Folder(FolderOperation::Create);
        assert_eq!(kind.operation(), OperationKind::Upload);
        assert_eq!(kind.target(), TaskTarget::Folder);
    }
}

//! Metadata catalog contract.
//!
//! The catalog owns the mapping from object id to the ordered list of message
//! ids holding the object's chunks. The storage engine only reaches it through
//! [`ObjectCatalog`].

mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};
use cordstore_shared::{MessageId, ObjectId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

pub use memory::InMemoryCatalog;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Catalog entry for one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object identifier.
    pub object_id: ObjectId,
    /// Object name, unique within the catalog.
    pub name: String,
    /// Object size in bytes.
    pub size: u64,
    /// Message ids in chunk order.
    pub message_ids: Vec<MessageId>,
    /// Set when a deletion stopped halfway and some chunks are gone.
    #[serde(default)]
    pub corrupted: bool,
    /// When the object was stored.
    pub created_at: DateTime<Utc>,
}

impl ObjectRecord {
    /// Create a record for a freshly uploaded object.
    #[must_use]
    pub fn new(
        object_id: ObjectId,
        name: impl Into<String>,
        size: u64,
        message_ids: Vec<MessageId>,
    ) -> Self {
        Self {
            object_id,
            name: name.into(),
            size,
            message_ids,
            corrupted: false,
            created_at: Utc::now(),
        }
    }
}

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No record for the object.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Another object already uses the name.
    #[error("an object named '{0}' already exists")]
    Conflict(String),

    /// A record with this id already exists.
    #[error("object {0} already exists")]
    DuplicateId(ObjectId),

    /// The backing store failed.
    #[error("catalog backend error: {message}")]
    Backend {
        /// What failed.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },
}

impl CatalogError {
    /// Create a backend error caused by `err`.
    #[must_use]
    pub fn backend(msg: impl Into<String>, err: impl Into<BoxError>) -> Self {
        Self::Backend {
            message: msg.into(),
            source: Some(err.into()),
        }
    }
}

impl From<CatalogError> for StorageError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => Self::not_found(err.to_string()),
            CatalogError::Conflict(_) | CatalogError::DuplicateId(_) => {
                Self::validation(err.to_string())
            }
            CatalogError::Backend { .. } => {
                Self::internal_caused_by("catalog operation failed", err)
            }
        }
    }
}

/// Store of object records.
pub trait ObjectCatalog: Send + Sync {
    /// Return the message ids of an object, in chunk order.
    fn resolve_message_ids(
        &self,
        object_id: ObjectId,
    ) -> impl Future<Output = Result<Vec<MessageId>, CatalogError>> + Send;

    /// Record a newly stored object.
    ///
    /// Fails with [`CatalogError::Conflict`] if the name is taken, or with
    /// [`CatalogError::DuplicateId`] if the id is already recorded. Existing
    /// records are never replaced.
    fn persist_message_ids(
        &self,
        record: ObjectRecord,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Forget an object.
    fn remove_object(
        &self,
        object_id: ObjectId,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Flag an object whose chunks were only partly deleted.
    fn mark_corrupted(
        &self,
        object_id: ObjectId,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Find an object by name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<ObjectRecord>, CatalogError>> + Send;

    /// List every object, oldest first.
    fn list_objects(&self) -> impl Future<Output = Result<Vec<ObjectRecord>, CatalogError>> + Send;
}

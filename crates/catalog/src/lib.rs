//! Object catalog persisted as a single JSON file.
//!
//! The whole catalog is kept in memory and rewritten on every change. Writes go
//! to a hidden sibling file first and are then renamed over the catalog, so a
//! crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cordstore_core::catalog::{CatalogError, ObjectCatalog, ObjectRecord};
use cordstore_shared::{MessageId, ObjectId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    version: u32,
    objects: Vec<ObjectRecord>,
}

/// [`ObjectCatalog`] backed by a JSON file.
#[derive(Debug)]
pub struct FileCatalog {
    path: PathBuf,
    records: Mutex<BTreeMap<ObjectId, ObjectRecord>>,
}

impl FileCatalog {
    /// Open the catalog at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(content) => {
                let document: CatalogDocument = serde_json::from_slice(&content).map_err(|e| {
                    CatalogError::backend(format!("failed to parse {}", path.display()), e)
                })?;
                if document.version != FORMAT_VERSION {
                    return Err(CatalogError::Backend {
                        message: format!(
                            "unsupported catalog version {} in {}",
                            document.version,
                            path.display()
                        ),
                        source: None,
                    });
                }
                document
                    .objects
                    .into_iter()
                    .map(|record| (record.object_id, record))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(CatalogError::backend(
                    format!("failed to read {}", path.display()),
                    e,
                ));
            }
        };

        info!(path = %path.display(), objects = records.len(), "Catalog opened");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the catalog file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, records: &BTreeMap<ObjectId, ObjectRecord>) -> Result<(), CatalogError> {
        let mut objects: Vec<ObjectRecord> = records.values().cloned().collect();
        objects.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.object_id.cmp(&b.object_id))
        });
        let document = CatalogDocument {
            version: FORMAT_VERSION,
            objects,
        };
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| CatalogError::backend("failed to serialize catalog", e))?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_file = dir.join(format!(".{name}.tmp"));

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            CatalogError::backend(format!("failed to create {}", dir.display()), e)
        })?;
        tokio::fs::write(&temp_file, json).await.map_err(|e| {
            CatalogError::backend(format!("failed to write {}", temp_file.display()), e)
        })?;
        tokio::fs::rename(&temp_file, &self.path).await.map_err(|e| {
            CatalogError::backend(format!("failed to replace {}", self.path.display()), e)
        })?;

        debug!(path = %self.path.display(), objects = records.len(), "Catalog saved");
        Ok(())
    }
}

impl ObjectCatalog for FileCatalog {
    async fn resolve_message_ids(&self, object_id: ObjectId) -> Result<Vec<MessageId>, CatalogError> {
        self.records
            .lock()
            .await
            .get(&object_id)
            .map(|r| r.message_ids.clone())
            .ok_or(CatalogError::NotFound(object_id))
    }

    async fn persist_message_ids(&self, record: ObjectRecord) -> Result<(), CatalogError> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.object_id) {
            return Err(CatalogError::DuplicateId(record.object_id));
        }
        if records.values().any(|r| r.name == record.name) {
            return Err(CatalogError::Conflict(record.name));
        }

        let object_id = record.object_id;
        records.insert(object_id, record);
        if let Err(e) = self.save(&records).await {
            records.remove(&object_id);
            return Err(e);
        }
        Ok(())
    }

    async fn remove_object(&self, object_id: ObjectId) -> Result<(), CatalogError> {
        let mut records = self.records.lock().await;
        let removed = records
            .remove(&object_id)
            .ok_or(CatalogError::NotFound(object_id))?;
        if let Err(e) = self.save(&records).await {
            records.insert(object_id, removed);
            return Err(e);
        }
        Ok(())
    }

    async fn mark_corrupted(&self, object_id: ObjectId) -> Result<(), CatalogError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&object_id)
            .ok_or(CatalogError::NotFound(object_id))?;
        if record.corrupted {
            return Ok(());
        }
        record.corrupted = true;
        if let Err(e) = self.save(&records).await {
            if let Some(record) = records.get_mut(&object_id) {
                record.corrupted = false;
            }
            return Err(e);
        }
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn list_objects(&self) -> Result<Vec<ObjectRecord>, CatalogError> {
        let mut objects: Vec<ObjectRecord> =
            self.records.lock().await.values().cloned().collect();
        objects.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.object_id.cmp(&b.object_id))
        });
        Ok(objects)
    }
}

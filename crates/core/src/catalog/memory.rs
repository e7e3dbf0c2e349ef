//! Process-local catalog.

use cordstore_shared::{MessageId, ObjectId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{CatalogError, ObjectCatalog, ObjectRecord};

/// Catalog held in memory, lost when the process exits.
///
/// Name uniqueness is enforced through a second map from name to id.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: DashMap<ObjectId, ObjectRecord>,
    names: DashMap<String, ObjectId>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, object_id: ObjectId) -> Option<ObjectRecord> {
        self.records.get(&object_id).map(|r| r.value().clone())
    }
}

impl ObjectCatalog for InMemoryCatalog {
    async fn resolve_message_ids(&self, object_id: ObjectId) -> Result<Vec<MessageId>, CatalogError> {
        self.records
            .get(&object_id)
            .map(|r| r.message_ids.clone())
            .ok_or(CatalogError::NotFound(object_id))
    }

    async fn persist_message_ids(&self, record: ObjectRecord) -> Result<(), CatalogError> {
        let Entry::Vacant(name_slot) = self.names.entry(record.name.clone()) else {
            return Err(CatalogError::Conflict(record.name));
        };
        match self.records.entry(record.object_id) {
            Entry::Occupied(_) => Err(CatalogError::DuplicateId(record.object_id)),
            Entry::Vacant(record_slot) => {
                name_slot.insert(record.object_id);
                record_slot.insert(record);
                Ok(())
            }
        }
    }

    async fn remove_object(&self, object_id: ObjectId) -> Result<(), CatalogError> {
        let (_, record) = self
            .records
            .remove(&object_id)
            .ok_or(CatalogError::NotFound(object_id))?;
        self.names.remove(&record.name);
        Ok(())
    }

    async fn mark_corrupted(&self, object_id: ObjectId) -> Result<(), CatalogError> {
        let mut record = self
            .records
            .get_mut(&object_id)
            .ok_or(CatalogError::NotFound(object_id))?;
        record.corrupted = true;
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        let Some(object_id) = self.names.get(name).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.get(object_id))
    }

    async fn list_objects(&self) -> Result<Vec<ObjectRecord>, CatalogError> {
        let mut records: Vec<ObjectRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.object_id.cmp(&b.object_id))
        });
        Ok(records)
    }
}

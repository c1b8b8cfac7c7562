use std::collections::HashMap;
use std::sync::Mutex;

use crate::catalog::ItemId;
use crate::recall::{MetadataPatch, RecallMetadata};

use super::{validate_patch, MetadataStore, Result, StoreError};

/// Metadata held only for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: Mutex<HashMap<ItemId, RecallMetadata>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn read(&self, id: &ItemId) -> Option<RecallMetadata> {
        self.records.lock().ok()?.get(id).cloned()
    }

    fn write(&self, id: &ItemId, patch: &MetadataPatch) -> Result<RecallMetadata> {
        validate_patch(id, patch)?;
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let record = records.entry(id.clone()).or_default();
        record.apply(patch);
        Ok(record.clone())
    }

    fn delete(&self, ids: &[ItemId]) -> Result<()> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        for id in ids {
            records.remove(id);
        }
        Ok(())
    }

    fn snapshot(&self) -> HashMap<ItemId, RecallMetadata> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

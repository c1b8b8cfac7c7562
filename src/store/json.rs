//! JSON file metadata store
//!
//! Layout:
//! ```text
//! {data-dir}/
//! └── metadata.json    # object keyed by item id
//! ```
//!
//! The file is read once on open and rewritten after every change.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::catalog::ItemId;
use crate::recall::{MetadataPatch, RecallMetadata};

use super::{validate_patch, MetadataStore, Result, StoreError};

pub struct JsonMetadataStore {
    path: PathBuf,
    records: Mutex<HashMap<ItemId, RecallMetadata>>,
}

impl JsonMetadataStore {
    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("recall"))
            .ok_or(StoreError::DataDirNotFound)
    }

    /// Open the store in `data_dir`, creating the directory if needed
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Self::open_file(data_dir.join("metadata.json"))
    }

    /// Open a specific metadata file; a missing file is an empty store
    pub fn open_file(path: PathBuf) -> Result<Self> {
        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        log::debug!(
            "metadata store: opened {} ({} records)",
            path.display(),
            records.len()
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &HashMap<ItemId, RecallMetadata>) -> Result<()> {
        // Sorted keys keep the file diffable
        let ordered: BTreeMap<&ItemId, &RecallMetadata> = records.iter().collect();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&ordered)?)?;
        Ok(())
    }
}

impl MetadataStore for JsonMetadataStore {
    fn read(&self, id: &ItemId) -> Option<RecallMetadata> {
        self.records.lock().ok()?.get(id).cloned()
    }

    fn write(&self, id: &ItemId, patch: &MetadataPatch) -> Result<RecallMetadata> {
        validate_patch(id, patch)?;
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;

        let mut record = records.get(id).cloned().unwrap_or_default();
        record.apply(patch);

        let previous = records.insert(id.clone(), record.clone());
        if let Err(e) = self.persist(&records) {
            // Keep memory consistent with disk
            match previous {
                Some(prev) => records.insert(id.clone(), prev),
                None => records.remove(id),
            };
            return Err(e);
        }

        Ok(record)
    }

    fn delete(&self, ids: &[ItemId]) -> Result<()> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        if !ids.iter().any(|id| records.contains_key(id)) {
            return Ok(());
        }

        let mut remaining = records.clone();
        for id in ids {
            remaining.remove(id);
        }
        // Memory only changes once the file does
        self.persist(&remaining)?;
        *records = remaining;
        Ok(())
    }

    fn snapshot(&self) -> HashMap<ItemId, RecallMetadata> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

//! Metadata store collaborators
//!
//! The scheduler reads and patches per-item [`RecallMetadata`] through
//! [`MetadataStore`]. Two implementations are provided: an in-memory map and a
//! JSON file that is rewritten on every change.

mod json;
mod memory;

pub use json::JsonMetadataStore;
pub use memory::InMemoryMetadataStore;

use std::collections::HashMap;

use thiserror::Error;

use crate::catalog::ItemId;
use crate::recall::{MetadataPatch, RecallMetadata};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid patch for {id}: {reason}")]
    InvalidPatch { id: ItemId, reason: String },

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Keyed access to recall metadata
pub trait MetadataStore: Send + Sync {
    fn read(&self, id: &ItemId) -> Option<RecallMetadata>;

    /// Merge `patch` into the record for `id`, creating it if needed
    fn write(&self, id: &ItemId, patch: &MetadataPatch) -> Result<RecallMetadata>;

    /// Remove records; unknown ids are ignored
    fn delete(&self, ids: &[ItemId]) -> Result<()>;

    /// Copy of every record, for building decks
    fn snapshot(&self) -> HashMap<ItemId, RecallMetadata>;
}

pub(crate) fn validate_patch(id: &ItemId, patch: &MetadataPatch) -> Result<()> {
    patch.validate().map_err(|reason| StoreError::InvalidPatch {
        id: id.clone(),
        reason,
    })
}

//! Catalog of study items
//!
//! The catalog is produced by import/caching code outside this crate. The
//! scheduler only reads it through [`CatalogProvider`].

mod models;

pub use models::{CatalogItem, CatalogKind, ItemId};

use std::fs;
use std::path::Path;

use crate::error::{Result, SchedulerError};
use crate::store::StoreError;
use models::CatalogRecord;

/// Read-only access to the catalog
pub trait CatalogProvider: Send + Sync {
    /// All items of one kind, in import order
    fn catalog(&self, kind: CatalogKind) -> Vec<CatalogItem>;

    fn find(&self, id: &ItemId) -> Result<CatalogItem>;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Load a JSON array of items; entries without a kind get `default_kind`
    pub fn from_json_file(path: &Path, default_kind: CatalogKind) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(StoreError::from)?;
        Self::from_json_str(&content, default_kind)
    }

    pub fn from_json_str(content: &str, default_kind: CatalogKind) -> Result<Self> {
        let records: Vec<CatalogRecord> =
            serde_json::from_str(content).map_err(StoreError::from)?;
        let items = records
            .into_iter()
            .map(|record| record.into_item(default_kind))
            .collect();
        Ok(Self { items })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CatalogProvider for InMemoryCatalog {
    fn catalog(&self, kind: CatalogKind) -> Vec<CatalogItem> {
        self.items
            .iter()
            .filter(|item| item.kind == kind)
            .cloned()
            .collect()
    }

    fn find(&self, id: &ItemId) -> Result<CatalogItem> {
        self.items
            .iter()
            .find(|item| &item.id == id)
            .cloned()
            .ok_or_else(|| SchedulerError::TermNotFound(id.clone()))
    }
}

//! Data models for catalog items

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for ids derived from item text
const ITEM_NAMESPACE: Uuid = Uuid::from_u128(0x6f0c_2d7e_4b1a_5c39_9e8d_71a2_b3c4_d5e6);

/// Stable identifier of a catalog item
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an id from the item's kind and label
    pub fn derive(kind: CatalogKind, label: &str) -> Self {
        let name = format!("{}:{}", kind.as_str(), label);
        Self(Uuid::new_v5(&ITEM_NAMESPACE, name.as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kind of study unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogKind {
    Vocabulary,
    Phrase,
    Kanji,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Vocabulary => "vocabulary",
            CatalogKind::Phrase => "phrase",
            CatalogKind::Kanji => "kanji",
        }
    }
}

impl Default for CatalogKind {
    fn default() -> Self {
        Self::Vocabulary
    }
}

/// One learnable unit, read-only to the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(default)]
    pub kind: CatalogKind,
    /// Text used for alphabetic ordering
    pub label: String,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Content shown to the learner; not interpreted here
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub content: serde_json::Value,
}

impl CatalogItem {
    pub fn new(kind: CatalogKind, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: ItemId::derive(kind, &label),
            kind,
            label,
            groups: Vec::new(),
            content: serde_json::Value::Null,
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// Catalog file entry; `id` and `kind` may be omitted by importers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CatalogRecord {
    pub id: Option<ItemId>,
    pub kind: Option<CatalogKind>,
    pub label: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl CatalogRecord {
    pub fn into_item(self, default_kind: CatalogKind) -> CatalogItem {
        let kind = self.kind.unwrap_or(default_kind);
        CatalogItem {
            id: self
                .id
                .unwrap_or_else(|| ItemId::derive(kind, &self.label)),
            kind,
            label: self.label,
            groups: self.groups,
            content: self.content,
        }
    }
}

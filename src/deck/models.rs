//! Data models for deck building

use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;

/// Which catalog items a session draws from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FilterMode {
    /// Items in any of the active groups; no active groups means everything
    Groups { active: Vec<String> },
    /// Only the reinforcement pool
    Frequency,
}

impl Default for FilterMode {
    fn default() -> Self {
        Self::Groups { active: Vec::new() }
    }
}

impl FilterMode {
    pub fn is_frequency(&self) -> bool {
        matches!(self, FilterMode::Frequency)
    }
}

/// Ordering policy for the working deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum SortStrategy {
    /// Failed and overdue first, capped per session
    Recall,
    /// By subjective difficulty; unrated items last
    #[serde(rename_all = "camelCase")]
    Difficulty { descending: bool },
    /// Least recently viewed first
    #[serde(rename_all = "camelCase")]
    ViewDate {
        include_new: bool,
        include_reviewed: bool,
    },
    Random,
    Alphabetic,
}

impl Default for SortStrategy {
    fn default() -> Self {
        Self::Recall
    }
}

/// Quick-scroll index produced by the alphabetic strategy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlphabeticIndex {
    /// Each label with the deck position where it starts
    pub labels: Vec<(String, usize)>,
    /// Label of every deck position
    pub by_position: Vec<String>,
}

impl AlphabeticIndex {
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, start)| *start)
    }

    pub fn label_at(&self, position: usize) -> Option<&str> {
        self.by_position.get(position).map(String::as_str)
    }
}

/// Ordered working set for one session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub items: Vec<ItemId>,
    /// Reinforcement pool within the filtered set
    pub pool: Vec<ItemId>,
    /// Items the recall strategy deferred to a later session
    pub overflow: Vec<ItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alphabetic: Option<AlphabeticIndex>,
    /// The filter actually applied, after stale groups were removed
    pub filter: FilterMode,
    pub dropped_groups: Vec<String>,
}

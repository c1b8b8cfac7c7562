//! Sort strategies
//!
//! Each strategy takes the filtered items (catalog order) and returns the
//! ordered ids. Every strategy except `random_order` is deterministic for
//! identical input; all sorts are stable.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{CatalogItem, ItemId};
use crate::recall::classifier::sanitize_percent;
use crate::recall::{Classifier, RecallMetadata, RecallState};

use super::collate::{compare_labels, CollationKey};
use super::models::AlphabeticIndex;
use super::partition::{partition, Partition};

fn ids(items: &[&CatalogItem]) -> Vec<ItemId> {
    items.iter().map(|item| item.id.clone()).collect()
}

fn last_viewed(metadata: &HashMap<ItemId, RecallMetadata>, id: &ItemId) -> Option<DateTime<Utc>> {
    metadata.get(id).and_then(|m| m.last_viewed_at())
}

/// Never-viewed first, then oldest view first
fn by_view_date(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

/// Failed and overdue items capped to `capacity`, with pending items in any
/// spare room. When nothing is admitted, unreviewed and reviewed-today items
/// are returned least recently viewed first; deferred items stay in overflow.
pub fn recall_order(
    items: &[&CatalogItem],
    metadata: &HashMap<ItemId, RecallMetadata>,
    classifier: &Classifier,
    now: DateTime<Utc>,
    capacity: usize,
) -> Partition<ItemId> {
    let mut failed = Vec::new();
    let mut overdue = Vec::new();
    let mut pending = Vec::new();
    let mut fallback = Vec::new();

    for item in items {
        let recall = classifier.classify_metadata(metadata.get(&item.id), now);
        match recall.state {
            RecallState::Failed => failed.push(item.id.clone()),
            RecallState::Due | RecallState::Overdue => overdue.push(item.id.clone()),
            RecallState::Pending => pending.push(item.id.clone()),
            RecallState::New | RecallState::SeenUnreviewed | RecallState::ReviewedToday => {
                fallback.push(*item)
            }
        }
    }

    let result = partition(&failed, &overdue, &pending, capacity);
    log::debug!(
        "recall order: {} failed, {} overdue, {} pending -> {} admitted, {} deferred",
        failed.len(),
        overdue.len(),
        pending.len(),
        result.admitted.len(),
        result.overflow.len()
    );

    if !result.admitted.is_empty() {
        return result;
    }

    fallback.sort_by(|a, b| by_view_date(last_viewed(metadata, &a.id), last_viewed(metadata, &b.id)));
    Partition {
        admitted: ids(&fallback),
        overflow: result.overflow,
    }
}

/// Ascending difficulty (descending when flipped); unrated items always last
pub fn difficulty_order(
    items: &[&CatalogItem],
    metadata: &HashMap<ItemId, RecallMetadata>,
    descending: bool,
) -> Vec<ItemId> {
    let difficulty =
        |id: &ItemId| sanitize_percent(metadata.get(id).and_then(|m| m.difficulty));

    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| match (difficulty(&a.id), difficulty(&b.id)) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ids(&sorted)
}

/// Oldest view first; never-viewed and reviewed items only when included
pub fn view_date_order(
    items: &[&CatalogItem],
    metadata: &HashMap<ItemId, RecallMetadata>,
    include_new: bool,
    include_reviewed: bool,
) -> Vec<ItemId> {
    let mut kept: Vec<&CatalogItem> = items
        .iter()
        .copied()
        .filter(|item| {
            let meta = metadata.get(&item.id);
            let viewed = meta.and_then(|m| m.last_viewed_at()).is_some();
            let reviewed = meta.map_or(false, |m| m.is_reviewed());
            (viewed || include_new) && (!reviewed || include_reviewed)
        })
        .collect();

    kept.sort_by(|a, b| by_view_date(last_viewed(metadata, &a.id), last_viewed(metadata, &b.id)));
    ids(&kept)
}

/// Uniform shuffle
pub fn random_order<R: Rng + ?Sized>(items: &[&CatalogItem], rng: &mut R) -> Vec<ItemId> {
    let mut shuffled = ids(items);
    shuffled.shuffle(rng);
    shuffled
}

/// Collation order plus the quick-scroll index
pub fn alphabetic_order(items: &[&CatalogItem]) -> (Vec<ItemId>, AlphabeticIndex) {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| compare_labels(&a.label, &b.label));

    let mut index = AlphabeticIndex::default();
    for (position, item) in sorted.iter().enumerate() {
        let label = CollationKey::new(&item.label).index_label();
        if index.labels.last().map_or(true, |(last, _)| *last != label) {
            index.labels.push((label.clone(), position));
        }
        index.by_position.push(label);
    }

    (ids(&sorted), index)
}

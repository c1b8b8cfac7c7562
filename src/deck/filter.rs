//! Catalog filtering

use std::collections::HashMap;

use crate::catalog::{CatalogItem, ItemId};
use crate::error::{ErrorCause, Result, SchedulerError};
use crate::recall::RecallMetadata;

use super::models::FilterMode;

pub(crate) fn is_reinforced(metadata: &HashMap<ItemId, RecallMetadata>, id: &ItemId) -> bool {
    metadata.get(id).map_or(false, |m| m.reinforced)
}

/// Items selected by `filter`, in catalog order
///
/// Fails with a stale reference for the first active group no item carries,
/// and with a configuration error when the frequency pool is empty.
pub fn apply_filter<'a>(
    items: &'a [CatalogItem],
    metadata: &HashMap<ItemId, RecallMetadata>,
    filter: &FilterMode,
) -> Result<Vec<&'a CatalogItem>> {
    match filter {
        FilterMode::Groups { active } if active.is_empty() => Ok(items.iter().collect()),
        FilterMode::Groups { active } => {
            if let Some(stale) = active
                .iter()
                .find(|group| !items.iter().any(|item| item.in_group(group)))
            {
                return Err(SchedulerError::StaleReference(
                    ErrorCause::stale_active_group(stale.as_str()),
                ));
            }

            Ok(items
                .iter()
                .filter(|item| active.iter().any(|group| item.in_group(group)))
                .collect())
        }
        FilterMode::Frequency => {
            let pool: Vec<&CatalogItem> = items
                .iter()
                .filter(|item| is_reinforced(metadata, &item.id))
                .collect();
            if pool.is_empty() {
                return Err(SchedulerError::Configuration(
                    "frequency filter requested but the reinforcement pool is empty".to_string(),
                ));
            }
            Ok(pool)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogKind;
    use crate::error::ErrorCode;
    use crate::recall::MetadataPatch;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(CatalogKind::Vocabulary, "inu").with_groups(["Animals"]),
            CatalogItem::new(CatalogKind::Vocabulary, "taberu").with_groups(["Verbs"]),
            CatalogItem::new(CatalogKind::Vocabulary, "neko").with_groups(["Animals", "Pets"]),
        ]
    }

    fn labels(items: &[&CatalogItem]) -> Vec<String> {
        items.iter().map(|i| i.label.clone()).collect()
    }

    #[test]
    fn test_no_active_groups_keeps_everything() {
        let items = catalog();
        let filtered = apply_filter(&items, &HashMap::new(), &FilterMode::default()).unwrap();
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_group_filter() {
        let items = catalog();
        let filter = FilterMode::Groups {
            active: vec!["Pets".to_string(), "Verbs".to_string()],
        };
        let filtered = apply_filter(&items, &HashMap::new(), &filter).unwrap();
        assert_eq!(labels(&filtered), vec!["taberu", "neko"]);
    }

    #[test]
    fn test_stale_group() {
        let items = catalog();
        let filter = FilterMode::Groups {
            active: vec!["Animals".to_string(), "Colors".to_string()],
        };
        let err = apply_filter(&items, &HashMap::new(), &filter).unwrap_err();
        let cause = err.cause().unwrap();
        assert_eq!(cause.code, ErrorCode::StaleActiveGroup);
        assert_eq!(cause.value.as_deref(), Some("Colors"));
    }

    #[test]
    fn test_frequency_filter() {
        let items = catalog();
        let mut metadata = HashMap::new();

        let err = apply_filter(&items, &metadata, &FilterMode::Frequency).unwrap_err();
        assert!(matches!(err, SchedulerError::Configuration(_)));

        let mut meta = RecallMetadata::default();
        meta.apply(&MetadataPatch::reinforced(true));
        metadata.insert(items[2].id.clone(), meta);

        let filtered = apply_filter(&items, &metadata, &FilterMode::Frequency).unwrap();
        assert_eq!(labels(&filtered), vec!["neko"]);
    }
}

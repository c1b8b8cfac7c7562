//! Deck building
//!
//! Turns the catalog plus metadata into the ordered working deck for one
//! session: filter (groups or reinforcement pool), then one of five sort
//! strategies, with the recall strategy capped by the capacity partitioner.

pub mod collate;
pub mod filter;
pub mod models;
pub mod partition;
pub mod strategies;

pub use models::*;
pub use partition::{partition, Partition};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{CatalogItem, ItemId};
use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::logging::ErrorChannel;
use crate::recall::{Classifier, RecallMetadata};

use filter::{apply_filter, is_reinforced};

/// Builds decks under the selected strategy
pub struct DeckBuilder {
    classifier: Classifier,
    capacity: usize,
    strategy: SortStrategy,
    /// Source of shuffle seeds
    seeds: StdRng,
    shuffle: StdRng,
    channel: Arc<dyn ErrorChannel>,
}

impl DeckBuilder {
    pub fn new(config: &SchedulerConfig, channel: Arc<dyn ErrorChannel>) -> Self {
        Self::with_rng(config, channel, StdRng::from_entropy())
    }

    /// Builder whose shuffles are reproducible
    pub fn with_seed(config: &SchedulerConfig, channel: Arc<dyn ErrorChannel>, seed: u64) -> Self {
        Self::with_rng(config, channel, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &SchedulerConfig, channel: Arc<dyn ErrorChannel>, mut seeds: StdRng) -> Self {
        let shuffle = StdRng::seed_from_u64(seeds.gen());
        Self {
            classifier: Classifier::new(config.classifier),
            capacity: config.session_capacity,
            strategy: SortStrategy::default(),
            seeds,
            shuffle,
            channel,
        }
    }

    pub fn strategy(&self) -> SortStrategy {
        self.strategy
    }

    /// Switch strategy; the shuffle is reseeded on every selection
    pub fn select_strategy(&mut self, strategy: SortStrategy) {
        self.strategy = strategy;
        self.shuffle = StdRng::seed_from_u64(self.seeds.gen());
    }

    /// Build the deck for `filter` at `now`
    ///
    /// Stale active groups are reported on the error channel and dropped from
    /// the filter; the build is then retried without them.
    pub fn build(
        &mut self,
        items: &[CatalogItem],
        metadata: &HashMap<ItemId, RecallMetadata>,
        filter: &FilterMode,
        now: DateTime<Utc>,
    ) -> Result<Deck> {
        let mut filter = filter.clone();
        let mut dropped_groups = Vec::new();

        let filtered = loop {
            match apply_filter(items, metadata, &filter) {
                Ok(filtered) => break filtered,
                Err(SchedulerError::StaleReference(cause)) => {
                    let Some(group) = cause.value.clone() else {
                        return Err(SchedulerError::StaleReference(cause));
                    };
                    self.channel.report(
                        &format!("deck: dropping stale active group '{}'", group),
                        SchedulerError::StaleReference(cause).severity(),
                    );
                    if let FilterMode::Groups { active } = &mut filter {
                        active.retain(|g| *g != group);
                    }
                    dropped_groups.push(group);
                }
                Err(e) => return Err(e),
            }
        };

        let pool: Vec<ItemId> = filtered
            .iter()
            .filter(|item| is_reinforced(metadata, &item.id))
            .map(|item| item.id.clone())
            .collect();

        let mut deck = Deck {
            pool,
            filter,
            dropped_groups,
            ..Default::default()
        };

        match self.strategy {
            SortStrategy::Recall => {
                let order = strategies::recall_order(
                    &filtered,
                    metadata,
                    &self.classifier,
                    now,
                    self.capacity,
                );
                deck.items = order.admitted;
                deck.overflow = order.overflow;
            }
            SortStrategy::Difficulty { descending } => {
                deck.items = strategies::difficulty_order(&filtered, metadata, descending);
            }
            SortStrategy::ViewDate {
                include_new,
                include_reviewed,
            } => {
                deck.items =
                    strategies::view_date_order(&filtered, metadata, include_new, include_reviewed);
            }
            SortStrategy::Random => {
                deck.items = strategies::random_order(&filtered, &mut self.shuffle);
            }
            SortStrategy::Alphabetic => {
                let (order, index) = strategies::alphabetic_order(&filtered);
                deck.items = order;
                deck.alphabetic = Some(index);
            }
        }

        log::debug!(
            "deck: {:?} produced {} items ({} in pool, {} deferred)",
            self.strategy,
            deck.items.len(),
            deck.pool.len(),
            deck.overflow.len()
        );

        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogKind;
    use crate::logging::{RecordingChannel, Severity};
    use crate::recall::MetadataPatch;

    fn catalog() -> Vec<CatalogItem> {
        (0..12)
            .map(|i| {
                let group = if i % 2 == 0 { "Even" } else { "Odd" };
                CatalogItem::new(CatalogKind::Vocabulary, format!("word{:02}", i)).with_groups([group])
            })
            .collect()
    }

    fn builder(channel: Arc<RecordingChannel>) -> DeckBuilder {
        DeckBuilder::with_seed(&SchedulerConfig::default(), channel, 42)
    }

    #[test]
    fn test_stale_group_is_dropped_and_logged() {
        let channel = Arc::new(RecordingChannel::new());
        let mut builder = builder(channel.clone());
        let items = catalog();
        let filter = FilterMode::Groups {
            active: vec!["Odd".to_string(), "Gone".to_string(), "Lost".to_string()],
        };

        let deck = builder
            .build(&items, &HashMap::new(), &filter, Utc::now())
            .unwrap();

        assert_eq!(deck.items.len(), 6);
        assert_eq!(deck.dropped_groups, vec!["Gone", "Lost"]);
        assert_eq!(
            deck.filter,
            FilterMode::Groups {
                active: vec!["Odd".to_string()]
            }
        );
        assert_eq!(channel.count_at(Severity::Warn), 2);
    }

    #[test]
    fn test_frequency_with_empty_pool_fails() {
        let mut builder = builder(Arc::new(RecordingChannel::new()));
        let result = builder.build(&catalog(), &HashMap::new(), &FilterMode::Frequency, Utc::now());
        assert!(matches!(result, Err(SchedulerError::Configuration(_))));
    }

    #[test]
    fn test_pool_is_reinforced_items_in_filter() {
        let items = catalog();
        let mut metadata: HashMap<ItemId, RecallMetadata> = HashMap::new();
        for item in items.iter().take(3) {
            metadata
                .entry(item.id.clone())
                .or_default()
                .apply(&MetadataPatch::reinforced(true));
        }

        let mut builder = builder(Arc::new(RecordingChannel::new()));
        let filter = FilterMode::Groups {
            active: vec!["Even".to_string()],
        };
        let deck = builder.build(&items, &metadata, &filter, Utc::now()).unwrap();
        assert_eq!(deck.pool, vec![items[0].id.clone(), items[2].id.clone()]);

        let deck = builder
            .build(&items, &metadata, &FilterMode::Frequency, Utc::now())
            .unwrap();
        assert_eq!(deck.items.len(), 3);
        assert_eq!(deck.pool.len(), 3);
    }

    #[test]
    fn test_random_strategy_reseeds_on_selection() {
        let items = catalog();
        let metadata = HashMap::new();
        let mut builder = builder(Arc::new(RecordingChannel::new()));

        builder.select_strategy(SortStrategy::Random);
        let first = builder
            .build(&items, &metadata, &FilterMode::default(), Utc::now())
            .unwrap();
        builder.select_strategy(SortStrategy::Random);
        let second = builder
            .build(&items, &metadata, &FilterMode::default(), Utc::now())
            .unwrap();

        assert_eq!(first.items.len(), items.len());
        assert_ne!(first.items, second.items);
    }

    #[test]
    fn test_alphabetic_strategy_returns_index() {
        let mut builder = builder(Arc::new(RecordingChannel::new()));
        builder.select_strategy(SortStrategy::Alphabetic);

        let deck = builder
            .build(&catalog(), &HashMap::new(), &FilterMode::default(), Utc::now())
            .unwrap();
        let index = deck.alphabetic.unwrap();
        assert_eq!(index.labels, vec![("W".to_string(), 0)]);
        assert_eq!(index.by_position.len(), 12);
    }

    #[test]
    fn test_recall_strategy_falls_back_to_new_items() {
        let mut builder = builder(Arc::new(RecordingChannel::new()));
        let items = catalog();
        let deck = builder
            .build(&items, &HashMap::new(), &FilterMode::default(), Utc::now())
            .unwrap();

        let expected: Vec<ItemId> = items.iter().map(|i| i.id.clone()).collect();
        assert_eq!(deck.items, expected);
        assert!(deck.overflow.is_empty());
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use recall_lib::catalog::{CatalogItem, CatalogKind, InMemoryCatalog, ItemId};
use recall_lib::config::SchedulerConfig;
use recall_lib::deck::{Deck, DeckBuilder, FilterMode, SortStrategy};
use recall_lib::logging::LogChannel;
use recall_lib::recall::{Classifier, RecallMetadata};
use recall_lib::store::{JsonMetadataStore, MetadataStore};

/// Shared state for CLI commands
pub struct App {
    pub config: SchedulerConfig,
    pub catalog: InMemoryCatalog,
    pub store: Arc<JsonMetadataStore>,
    pub channel: Arc<LogChannel>,
}

/// Config from `path`, or from the default location
pub fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => SchedulerConfig::default_path().context("Failed to locate config directory")?,
    };
    SchedulerConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

impl App {
    /// Load catalog and metadata store
    pub fn new(config: SchedulerConfig, catalog: &Path, metadata: Option<PathBuf>) -> Result<Self> {
        let catalog = InMemoryCatalog::from_json_file(catalog, CatalogKind::default())
            .with_context(|| format!("Failed to read catalog {}", catalog.display()))?;

        let store = match metadata {
            Some(path) => JsonMetadataStore::open_file(path),
            None => JsonMetadataStore::default_data_dir().and_then(|dir| JsonMetadataStore::open(&dir)),
        }
        .context("Failed to open metadata store")?;

        log::debug!(
            "cli: {} catalog items, metadata at {}",
            catalog.len(),
            store.path().display()
        );

        let channel = Arc::new(LogChannel::new(config.log_severity));
        Ok(Self {
            config,
            catalog,
            store: Arc::new(store),
            channel,
        })
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.config.classifier)
    }

    pub fn metadata(&self) -> HashMap<ItemId, RecallMetadata> {
        self.store.snapshot()
    }

    pub fn items(&self) -> &[CatalogItem] {
        self.catalog.items()
    }

    pub fn label_of<'a>(&'a self, id: &ItemId) -> &'a str {
        self.items()
            .iter()
            .find(|item| &item.id == id)
            .map(|item| item.label.as_str())
            .unwrap_or("?")
    }

    /// Build a deck with the given strategy and filter
    pub fn build_deck(
        &self,
        strategy: SortStrategy,
        filter: &FilterMode,
        seed: Option<u64>,
    ) -> Result<Deck> {
        let mut builder = match seed {
            Some(seed) => DeckBuilder::with_seed(&self.config, self.channel.clone(), seed),
            None => DeckBuilder::new(&self.config, self.channel.clone()),
        };
        builder.select_strategy(strategy);
        builder
            .build(self.items(), &self.metadata(), filter, Utc::now())
            .context("Failed to build deck")
    }
}

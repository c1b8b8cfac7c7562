//! Recall scheduling for a study-card app
//!
//! Given a catalog of study items and per-item review metadata, the crate
//! classifies each item's recall state, builds ordered working decks, and
//! drives a study session (manual or timed) that records views back to the
//! metadata store.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod deck;
pub mod error;
pub mod logging;
pub mod practice;
pub mod recall;
pub mod session;
pub mod store;

pub use catalog::{CatalogItem, CatalogKind, CatalogProvider, InMemoryCatalog, ItemId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use deck::{Deck, DeckBuilder, FilterMode, SortStrategy};
pub use error::{ErrorCause, ErrorCode, Result, SchedulerError};
pub use logging::{ErrorChannel, LogChannel, RecordingChannel, Severity};
pub use practice::{PracticeError, TimedLoopHandle, TimedState};
pub use recall::{Classifier, MetadataPatch, Recall, RecallMetadata, RecallState, RecallSummary};
pub use session::{MotionSensor, SessionView, StudySession};
pub use store::{InMemoryMetadataStore, JsonMetadataStore, MetadataStore, StoreError};

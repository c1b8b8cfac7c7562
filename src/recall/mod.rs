//! Recall classification for study items
//!
//! This module provides:
//! - Per-item recall metadata (viewed/reviewed stages, difficulty, pool flag)
//! - The recall classifier (state + overdue ratio)
//! - Aggregate statistics over a catalog

pub mod classifier;
pub mod models;
pub mod stats;

pub use classifier::Classifier;
pub use models::*;
pub use stats::{Quartiles, RecallSummary};

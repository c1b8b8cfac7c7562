//! Update-time guards
//!
//! Navigation is immediate, but its side effects are not: a metadata write is
//! skipped when the learner is scrolling faster than the write window, and
//! timed play cannot restart right after a manual interaction.

use chrono::{DateTime, Utc};

use crate::clock::millis_since;
use crate::config::GuardConfig;

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateGuards {
    config: GuardConfig,
}

impl UpdateGuards {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// At least the write window (1500ms by default) since the last advance
    pub fn can_write_spaced_repetition(
        &self,
        last_advance_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        elapsed_at_least(last_advance_at, now, self.config.spaced_repetition_write_ms)
    }

    /// At least the resume window (300ms by default) since the last advance
    pub fn can_resume_timed_play(
        &self,
        last_advance_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        elapsed_at_least(last_advance_at, now, self.config.timed_play_resume_ms)
    }
}

fn elapsed_at_least(since: Option<DateTime<Utc>>, now: DateTime<Utc>, window_ms: u64) -> bool {
    match since {
        Some(since) => millis_since(since, now) >= window_ms as i64,
        None => true,
    }
}

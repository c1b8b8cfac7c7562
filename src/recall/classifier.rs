//! Recall classification
//!
//! Maps an item's grading history to a [`RecallState`] and an overdue ratio:
//!
//! - never graded: `New`, or `SeenUnreviewed` when it has been displayed
//! - accuracy below the passing threshold: `Failed`, whatever the timing
//! - no interval yet: `Due`
//! - otherwise `ratio = days since review / interval`, clamped to the
//!   ceiling: `<= 0` reviewed today, `< 1` pending, `< ceiling` due,
//!   at the ceiling overdue
//!
//! Classification is pure; malformed values are sanitized, never rejected.

use chrono::{DateTime, Utc};

use crate::clock::days_since;
use crate::config::ClassifierConfig;

use super::models::{Recall, RecallMetadata, RecallState};

#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify from raw values; `days_since_review` is `None` when the item
    /// has never been graded
    pub fn classify(
        &self,
        accuracy: Option<f64>,
        interval_days: Option<f64>,
        days_since_review: Option<f64>,
    ) -> Recall {
        let Some(days) = days_since_review else {
            return Recall {
                state: RecallState::New,
                ratio: 0.0,
            };
        };
        let days = if days.is_finite() { days.max(0.0) } else { 0.0 };
        let interval = sanitize_interval(interval_days);
        let ratio = interval.map(|interval| self.overdue_ratio(days, interval));

        if let Some(accuracy) = sanitize_percent(accuracy) {
            if accuracy / 100.0 < self.config.min_passing_accuracy {
                return Recall {
                    state: RecallState::Failed,
                    ratio: ratio.unwrap_or(0.0),
                };
            }
        }

        let Some(ratio) = ratio else {
            return Recall {
                state: RecallState::Due,
                ratio: 1.0,
            };
        };

        let state = if ratio <= 0.0 {
            RecallState::ReviewedToday
        } else if ratio < 1.0 {
            RecallState::Pending
        } else if ratio < self.config.ratio_ceiling {
            RecallState::Due
        } else {
            RecallState::Overdue
        };

        Recall { state, ratio }
    }

    /// Classify a stored record at `now`; a missing record is a new item
    pub fn classify_metadata(&self, meta: Option<&RecallMetadata>, now: DateTime<Utc>) -> Recall {
        let Some(meta) = meta else {
            return Recall {
                state: RecallState::New,
                ratio: 0.0,
            };
        };

        match meta.last_reviewed_at() {
            Some(reviewed_at) => self.classify(
                meta.accuracy(),
                meta.interval_days(),
                Some(days_since(reviewed_at, now) as f64),
            ),
            None if meta.last_viewed_at().is_some() => Recall {
                state: RecallState::SeenUnreviewed,
                ratio: 0.0,
            },
            None => Recall {
                state: RecallState::New,
                ratio: 0.0,
            },
        }
    }

    /// Days since review over the interval, clamped to `[0, ceiling]`
    pub fn overdue_ratio(&self, days_since_review: f64, interval_days: f64) -> f64 {
        (days_since_review / interval_days).clamp(0.0, self.config.ratio_ceiling)
    }
}

/// Percentages outside [0, 100] are clamped; NaN counts as absent
pub(crate) fn sanitize_percent(value: Option<f64>) -> Option<f64> {
    value
        .filter(|v| !v.is_nan())
        .map(|v| v.clamp(0.0, 100.0))
}

/// Only a positive, finite interval is usable
fn sanitize_interval(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

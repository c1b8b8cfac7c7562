//! Data models for recall bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recall state of one item at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecallState {
    /// Never displayed, never graded
    New,
    /// Displayed but never graded
    SeenUnreviewed,
    /// Last graded review was below the passing accuracy
    Failed,
    /// Graded within the current day
    ReviewedToday,
    /// Graded, interval not yet elapsed
    Pending,
    /// Interval elapsed
    Due,
    /// Elapsed time reached the ratio ceiling
    Overdue,
}

/// Result of classifying one item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recall {
    pub state: RecallState,
    /// Days since review over interval, clamped to the ratio ceiling
    pub ratio: f64,
}

/// Graded-review part of the metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: DateTime<Utc>,
    /// Percentage [0, 100]
    pub accuracy: Option<f64>,
    pub interval_days: Option<f64>,
}

/// How far an item has progressed
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReviewStage {
    #[default]
    Unseen,
    Viewed {
        last_viewed_at: DateTime<Utc>,
    },
    Reviewed(ReviewRecord),
}

/// Per-item spaced repetition bookkeeping
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "StoredMetadata", into = "StoredMetadata")]
pub struct RecallMetadata {
    pub stage: ReviewStage,
    /// Percentage [0, 100], independent of accuracy
    pub difficulty: Option<f64>,
    /// Member of the reinforcement pool
    pub reinforced: bool,
    /// Fields owned by other components, kept verbatim
    pub extra: Map<String, Value>,
}

impl RecallMetadata {
    pub fn last_viewed_at(&self) -> Option<DateTime<Utc>> {
        match &self.stage {
            ReviewStage::Unseen => None,
            ReviewStage::Viewed { last_viewed_at } => Some(*last_viewed_at),
            ReviewStage::Reviewed(record) => record.last_viewed_at,
        }
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        match &self.stage {
            ReviewStage::Reviewed(record) => Some(record.last_reviewed_at),
            _ => None,
        }
    }

    pub fn accuracy(&self) -> Option<f64> {
        match &self.stage {
            ReviewStage::Reviewed(record) => record.accuracy,
            _ => None,
        }
    }

    pub fn interval_days(&self) -> Option<f64> {
        match &self.stage {
            ReviewStage::Reviewed(record) => record.interval_days,
            _ => None,
        }
    }

    pub fn is_reviewed(&self) -> bool {
        matches!(self.stage, ReviewStage::Reviewed(_))
    }

    /// Merge a patch into this record
    pub fn apply(&mut self, patch: &MetadataPatch) {
        let mut stored = StoredMetadata::from(std::mem::take(self));

        if let Some(at) = patch.last_viewed_at {
            stored.last_viewed_at = Some(at);
        }
        if let Some(at) = patch.last_reviewed_at {
            stored.last_reviewed_at = Some(at);
        }
        if let Some(accuracy) = patch.accuracy {
            stored.accuracy = Some(accuracy);
        }
        if let Some(interval) = patch.interval_days {
            stored.interval_days = Some(interval);
        }
        if let Some(difficulty) = patch.difficulty {
            stored.difficulty = difficulty;
        }
        if let Some(reinforced) = patch.reinforced {
            stored.reinforced = reinforced;
        }
        for (key, value) in &patch.extra {
            stored.extra.insert(key.clone(), value.clone());
        }

        *self = stored.into();
    }
}

/// Partial update of a metadata record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// `Some(None)` clears the difficulty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinforced: Option<bool>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl MetadataPatch {
    pub fn viewed(at: DateTime<Utc>) -> Self {
        Self {
            last_viewed_at: Some(at),
            ..Default::default()
        }
    }

    pub fn reinforced(reinforced: bool) -> Self {
        Self {
            reinforced: Some(reinforced),
            ..Default::default()
        }
    }

    /// Check the record invariants the patch would introduce
    pub fn validate(&self) -> Result<(), String> {
        if let Some(accuracy) = self.accuracy {
            if !(0.0..=100.0).contains(&accuracy) {
                return Err(format!("accuracy must be within [0, 100], got {}", accuracy));
            }
        }
        if let Some(Some(difficulty)) = self.difficulty {
            if !(0.0..=100.0).contains(&difficulty) {
                return Err(format!(
                    "difficulty must be within [0, 100], got {}",
                    difficulty
                ));
            }
        }
        if let Some(interval) = self.interval_days {
            if interval <= 0.0 || !interval.is_finite() {
                return Err(format!("intervalDays must be positive, got {}", interval));
            }
        }
        Ok(())
    }
}

/// Flat on-disk shape of [`RecallMetadata`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_viewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval_days: Option<f64>,
    #[serde(default)]
    reinforced: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

const ACCURACY_KEY: &str = "accuracy";
const INTERVAL_KEY: &str = "intervalDays";

impl From<StoredMetadata> for RecallMetadata {
    fn from(stored: StoredMetadata) -> Self {
        let mut extra = stored.extra;

        let stage = match (stored.last_reviewed_at, stored.last_viewed_at) {
            (Some(last_reviewed_at), last_viewed_at) => ReviewStage::Reviewed(ReviewRecord {
                last_viewed_at,
                last_reviewed_at,
                accuracy: stored.accuracy,
                interval_days: stored.interval_days,
            }),
            (None, viewed) => {
                // Grading fields without a review have no stage to live in;
                // keep them with the opaque fields so nothing is lost.
                if let Some(accuracy) = stored.accuracy {
                    extra.insert(ACCURACY_KEY.to_string(), Value::from(accuracy));
                }
                if let Some(interval) = stored.interval_days {
                    extra.insert(INTERVAL_KEY.to_string(), Value::from(interval));
                }
                match viewed {
                    Some(last_viewed_at) => ReviewStage::Viewed { last_viewed_at },
                    None => ReviewStage::Unseen,
                }
            }
        };

        Self {
            stage,
            difficulty: stored.difficulty,
            reinforced: stored.reinforced,
            extra,
        }
    }
}

impl From<RecallMetadata> for StoredMetadata {
    fn from(meta: RecallMetadata) -> Self {
        let mut extra = meta.extra;
        let mut stored = StoredMetadata {
            difficulty: meta.difficulty,
            reinforced: meta.reinforced,
            ..Default::default()
        };

        match meta.stage {
            ReviewStage::Unseen => {}
            ReviewStage::Viewed { last_viewed_at } => {
                stored.last_viewed_at = Some(last_viewed_at);
            }
            ReviewStage::Reviewed(record) => {
                stored.last_viewed_at = record.last_viewed_at;
                stored.last_reviewed_at = Some(record.last_reviewed_at);
                stored.accuracy = record.accuracy;
                stored.interval_days = record.interval_days;
            }
        }

        // Stashed grading fields move back to their named slots
        if stored.accuracy.is_none() {
            stored.accuracy = extra.remove(ACCURACY_KEY).and_then(|v| v.as_f64());
        } else {
            extra.remove(ACCURACY_KEY);
        }
        if stored.interval_days.is_none() {
            stored.interval_days = extra.remove(INTERVAL_KEY).and_then(|v| v.as_f64());
        } else {
            extra.remove(INTERVAL_KEY);
        }

        stored.extra = extra;
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_stage_follows_timestamps() {
        let mut meta = RecallMetadata::default();
        assert_eq!(meta.stage, ReviewStage::Unseen);

        meta.apply(&MetadataPatch::viewed(day(1)));
        assert_eq!(meta.last_viewed_at(), Some(day(1)));
        assert!(!meta.is_reviewed());

        meta.apply(&MetadataPatch {
            last_reviewed_at: Some(day(2)),
            accuracy: Some(92.0),
            interval_days: Some(3.0),
            ..Default::default()
        });
        assert!(meta.is_reviewed());
        assert_eq!(meta.last_viewed_at(), Some(day(1)));
        assert_eq!(meta.last_reviewed_at(), Some(day(2)));
        assert_eq!(meta.accuracy(), Some(92.0));
        assert_eq!(meta.interval_days(), Some(3.0));
    }

    #[test]
    fn test_opaque_fields_survive_json() {
        let json = r#"{
            "lastViewedAt": "2024-05-01T12:00:00Z",
            "lastReviewedAt": "2024-05-01T12:00:00Z",
            "accuracy": 80,
            "reinforced": true,
            "consecutiveCorrect": 4,
            "furiganaShown": false
        }"#;

        let meta: RecallMetadata = serde_json::from_str(json).unwrap();
        assert!(meta.reinforced);
        assert_eq!(meta.accuracy(), Some(80.0));
        assert_eq!(meta.extra.get("consecutiveCorrect"), Some(&Value::from(4)));

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["consecutiveCorrect"], Value::from(4));
        assert_eq!(back["furiganaShown"], Value::from(false));
        assert_eq!(back["accuracy"], Value::from(80.0));
    }

    #[test]
    fn test_grading_fields_without_review_are_kept() {
        let json = r#"{"lastViewedAt": "2024-05-01T12:00:00Z", "intervalDays": 2}"#;
        let meta: RecallMetadata = serde_json::from_str(json).unwrap();

        assert!(!meta.is_reviewed());
        assert_eq!(meta.interval_days(), None);

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["intervalDays"], Value::from(2.0));
    }

    #[test]
    fn test_patch_clears_difficulty() {
        let mut meta = RecallMetadata {
            difficulty: Some(40.0),
            ..Default::default()
        };
        meta.apply(&MetadataPatch {
            difficulty: Some(None),
            ..Default::default()
        });
        assert_eq!(meta.difficulty, None);
    }

    #[test]
    fn test_patch_validation() {
        assert!(MetadataPatch::viewed(day(1)).validate().is_ok());

        let bad_accuracy = MetadataPatch {
            accuracy: Some(101.0),
            ..Default::default()
        };
        assert!(bad_accuracy.validate().is_err());

        let bad_interval = MetadataPatch {
            interval_days: Some(0.0),
            ..Default::default()
        };
        assert!(bad_interval.validate().is_err());

        let bad_difficulty = MetadataPatch {
            difficulty: Some(Some(-1.0)),
            ..Default::default()
        };
        assert!(bad_difficulty.validate().is_err());
    }
}

//! Read-only aggregate statistics over classified items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::Classifier;
use super::models::{RecallMetadata, RecallState};

/// Number of equal-width ratio buckets between 0 and the ratio ceiling
pub const HISTOGRAM_BUCKETS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

/// Counts per recall state plus the ratio distribution of graded items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallSummary {
    pub total: usize,
    pub new: usize,
    pub seen_unreviewed: usize,
    pub failed: usize,
    pub reviewed_today: usize,
    pub pending: usize,
    pub due: usize,
    pub overdue: usize,
    pub reinforced: usize,
    pub histogram: [usize; HISTOGRAM_BUCKETS],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quartiles: Option<Quartiles>,
}

impl Default for RecallSummary {
    fn default() -> Self {
        Self {
            total: 0,
            new: 0,
            seen_unreviewed: 0,
            failed: 0,
            reviewed_today: 0,
            pending: 0,
            due: 0,
            overdue: 0,
            reinforced: 0,
            histogram: [0; HISTOGRAM_BUCKETS],
            quartiles: None,
        }
    }
}

impl RecallSummary {
    /// Summarize records as of `now`; `None` entries are items without metadata
    pub fn collect<'a, I>(classifier: &Classifier, records: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = Option<&'a RecallMetadata>>,
    {
        let ceiling = classifier.config().ratio_ceiling;
        let mut summary = RecallSummary::default();
        let mut ratios = Vec::new();

        for meta in records {
            summary.total += 1;
            if meta.map_or(false, |m| m.reinforced) {
                summary.reinforced += 1;
            }

            let recall = classifier.classify_metadata(meta, now);
            match recall.state {
                RecallState::New => summary.new += 1,
                RecallState::SeenUnreviewed => summary.seen_unreviewed += 1,
                RecallState::Failed => summary.failed += 1,
                RecallState::ReviewedToday => summary.reviewed_today += 1,
                RecallState::Pending => summary.pending += 1,
                RecallState::Due => summary.due += 1,
                RecallState::Overdue => summary.overdue += 1,
            }

            if !matches!(recall.state, RecallState::New | RecallState::SeenUnreviewed) {
                let bucket = ((recall.ratio / ceiling) * HISTOGRAM_BUCKETS as f64).floor() as usize;
                summary.histogram[bucket.min(HISTOGRAM_BUCKETS - 1)] += 1;
                ratios.push(recall.ratio);
            }
        }

        ratios.sort_by(|a, b| a.total_cmp(b));
        if !ratios.is_empty() {
            summary.quartiles = Some(Quartiles {
                q1: quantile(&ratios, 0.25),
                median: quantile(&ratios, 0.5),
                q3: quantile(&ratios, 0.75),
            });
        }

        summary
    }
}

/// Linear-interpolated quantile of sorted, non-empty values
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use crate::recall::models::MetadataPatch;
    use chrono::{Duration, TimeZone};

    fn reviewed(now: DateTime<Utc>, days_ago: i64, interval: f64, accuracy: f64) -> RecallMetadata {
        let mut meta = RecallMetadata::default();
        meta.apply(&MetadataPatch {
            last_reviewed_at: Some(now - Duration::days(days_ago)),
            interval_days: Some(interval),
            accuracy: Some(accuracy),
            ..Default::default()
        });
        meta
    }

    #[test]
    fn test_empty_summary() {
        let classifier = Classifier::new(ClassifierConfig::default());
        let summary = RecallSummary::collect(&classifier, Vec::new(), Utc::now());
        assert_eq!(summary, RecallSummary::default());
        assert!(summary.quartiles.is_none());
    }

    #[test]
    fn test_counts_and_quartiles() {
        let classifier = Classifier::new(ClassifierConfig::default());
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();

        let mut reinforced = reviewed(now, 2, 4.0, 95.0);
        reinforced.reinforced = true;
        let records = vec![
            reinforced,                   // 0.5 pending
            reviewed(now, 4, 4.0, 95.0),  // 1.0 due
            reviewed(now, 6, 4.0, 95.0),  // 1.5 due
            reviewed(now, 20, 4.0, 50.0), // 2.0 failed
        ];
        let mut all: Vec<Option<&RecallMetadata>> = records.iter().map(Some).collect();
        all.push(None);

        let summary = RecallSummary::collect(&classifier, all, now);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.new, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.due, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.reinforced, 1);

        assert_eq!(summary.histogram[2], 1);
        assert_eq!(summary.histogram[5], 1);
        assert_eq!(summary.histogram[7], 1);
        assert_eq!(summary.histogram[9], 1);

        let quartiles = summary.quartiles.unwrap();
        assert_eq!(quartiles.q1, 0.875);
        assert_eq!(quartiles.median, 1.25);
        assert_eq!(quartiles.q3, 1.625);
    }
}

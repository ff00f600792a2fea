//! Statistics analyzer: accuracy breakdowns and weak-area detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Analyzer, LearningSnapshot};
use crate::types::BucketStats;

/// A category the user underperforms in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakArea {
    pub category: String,
    pub accuracy: f64,
}

/// Accuracy breakdowns over one user's attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsReport {
    /// Over all attempts, 0-100.
    pub overall_accuracy: f64,
    pub difficulty_stats: BTreeMap<String, BucketStats>,
    pub category_stats: BTreeMap<String, BucketStats>,
    pub type_stats: BTreeMap<String, BucketStats>,
    /// Worst categories first.
    pub weak_areas: Vec<WeakArea>,
}

/// Statistics analyzer with configurable weak-area thresholds.
#[derive(Debug, Clone)]
pub struct StatisticsAnalyzer {
    /// Categories below this accuracy qualify as weak.
    pub weak_accuracy_threshold: f64,
    /// Minimum attempts in a category before it can qualify.
    pub weak_min_attempts: usize,
    /// At most this many weak areas are reported.
    pub weak_area_limit: usize,
}

impl Default for StatisticsAnalyzer {
    fn default() -> Self {
        Self {
            weak_accuracy_threshold: 60.0,
            weak_min_attempts: 3,
            weak_area_limit: 5,
        }
    }
}

impl Analyzer for StatisticsAnalyzer {
    type Report = StatisticsReport;

    fn name(&self) -> &'static str {
        "statistics"
    }

    fn analyze(&self, snapshot: &LearningSnapshot) -> StatisticsReport {
        if snapshot.attempts.is_empty() {
            return StatisticsReport::default();
        }

        let index = snapshot.question_index();
        let correct_count = snapshot.attempts.iter().filter(|a| a.correct).count();
        let overall_accuracy = correct_count as f64 / snapshot.attempts.len() as f64 * 100.0;

        let mut difficulty: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        let mut category: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        let mut qtype: BTreeMap<String, (usize, usize)> = BTreeMap::new();

        for attempt in &snapshot.attempts {
            // Attempts whose question was removed from the bank are skipped;
            // unlabeled questions are skipped per missing label.
            let Some(question) = index.get(attempt.question_id.as_str()) else {
                continue;
            };
            for (label, bucket) in [
                (&question.difficulty, &mut difficulty),
                (&question.category, &mut category),
                (&question.qtype, &mut qtype),
            ] {
                if let Some(label) = label {
                    let entry = bucket.entry(label.clone()).or_default();
                    entry.0 += 1;
                    if attempt.correct {
                        entry.1 += 1;
                    }
                }
            }
        }

        let finalize = |buckets: BTreeMap<String, (usize, usize)>| {
            buckets
                .into_iter()
                .map(|(label, (total, correct))| (label, BucketStats::from_counts(total, correct)))
                .collect::<BTreeMap<_, _>>()
        };

        let category_stats = finalize(category);

        let mut weak_areas: Vec<WeakArea> = category_stats
            .iter()
            .filter(|(_, stats)| {
                stats.accuracy < self.weak_accuracy_threshold
                    && stats.total >= self.weak_min_attempts
            })
            .map(|(label, stats)| WeakArea {
                category: label.clone(),
                accuracy: stats.accuracy,
            })
            .collect();
        weak_areas.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
        weak_areas.truncate(self.weak_area_limit);

        StatisticsReport {
            overall_accuracy,
            difficulty_stats: finalize(difficulty),
            category_stats,
            type_stats: finalize(qtype),
            weak_areas,
        }
    }
}

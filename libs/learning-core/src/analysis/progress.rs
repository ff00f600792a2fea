//! Progress tracking and daily learning trend.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Analyzer, LearningSnapshot};
use crate::types::LearningProgress;

/// One day of the learning trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: usize,
    pub correct: usize,
    /// 0-100.
    pub accuracy: f64,
}

/// Progress plus derived rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub progress: LearningProgress,
    /// Distinct questions answered / bank size, 0-100.
    pub completion_rate: f64,
    pub remaining: usize,
}

/// Derives completion and accuracy figures from the snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker;

impl Analyzer for ProgressTracker {
    type Report = ProgressReport;

    fn name(&self) -> &'static str {
        "progress"
    }

    fn analyze(&self, snapshot: &LearningSnapshot) -> ProgressReport {
        let total_questions = snapshot.questions.len();
        let answered_questions = snapshot.answered_ids().len();
        let correct_count = snapshot.attempts.iter().filter(|a| a.correct).count();
        let wrong_count = snapshot.attempts.len() - correct_count;
        let accuracy_rate = if snapshot.attempts.is_empty() {
            0.0
        } else {
            correct_count as f64 / snapshot.attempts.len() as f64 * 100.0
        };

        let progress = LearningProgress {
            total_questions,
            answered_questions,
            correct_count,
            wrong_count,
            accuracy_rate,
            current_seq_qid: snapshot.current_seq_qid.clone(),
        };
        let completion_rate = progress.completion_rate();

        ProgressReport {
            progress,
            completion_rate,
            remaining: total_questions.saturating_sub(answered_questions),
        }
    }
}

impl ProgressTracker {
    /// Daily totals over the trailing `days`-day window ending at `now`.
    /// Days without activity are omitted; output is sorted by date.
    pub fn learning_trend(
        &self,
        snapshot: &LearningSnapshot,
        days: u32,
        now: DateTime<Utc>,
    ) -> Vec<TrendPoint> {
        let start = now - Duration::days(i64::from(days));
        let mut daily: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

        for attempt in &snapshot.attempts {
            if attempt.timestamp >= start && attempt.timestamp <= now {
                let entry = daily.entry(attempt.timestamp.date_naive()).or_default();
                entry.0 += 1;
                if attempt.correct {
                    entry.1 += 1;
                }
            }
        }

        daily
            .into_iter()
            .map(|(date, (total, correct))| TrendPoint {
                date,
                total,
                correct,
                accuracy: if total > 0 {
                    correct as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect()
    }
}

//! Analyzers over a user's learning history.
//!
//! Each analyzer consumes a [`LearningSnapshot`] (the question bank plus one
//! user's attempts, loaded from storage by the caller) and produces a derived
//! report. Analyzers are pure: no I/O, recomputed per request.

pub mod progress;
pub mod stats;

use std::collections::{HashMap, HashSet};

use crate::types::{AnswerRecord, Question};

pub use progress::{ProgressReport, ProgressTracker, TrendPoint};
pub use stats::{StatisticsAnalyzer, StatisticsReport, WeakArea};

/// A point-in-time view of the question bank and one user's history.
#[derive(Debug, Clone, Default)]
pub struct LearningSnapshot {
    pub questions: Vec<Question>,
    /// Attempts, newest first. Append-only in storage.
    pub attempts: Vec<AnswerRecord>,
    /// Sequential-mode cursor from the user record.
    pub current_seq_qid: Option<String>,
}

impl LearningSnapshot {
    /// Index questions by id for joining attempts to their labels.
    pub fn question_index(&self) -> HashMap<&str, &Question> {
        self.questions.iter().map(|q| (q.id.as_str(), q)).collect()
    }

    /// Distinct ids of questions the user has attempted.
    pub fn answered_ids(&self) -> HashSet<&str> {
        self.attempts
            .iter()
            .map(|a| a.question_id.as_str())
            .collect()
    }

    /// Distinct ids of questions the user has ever answered wrong.
    pub fn wrong_ids(&self) -> HashSet<&str> {
        self.attempts
            .iter()
            .filter(|a| !a.correct)
            .map(|a| a.question_id.as_str())
            .collect()
    }
}

/// Common interface for analyzers.
pub trait Analyzer {
    type Report;

    /// Analyzer identifier.
    fn name(&self) -> &'static str;

    /// Compute the report for one user's snapshot.
    fn analyze(&self, snapshot: &LearningSnapshot) -> Self::Report;
}

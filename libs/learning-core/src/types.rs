//! Core types for the exam practice platform.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty labels as they appear in the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// The label used in the CSV bank and the `questions` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "易",
            Self::Medium => "中",
            Self::Hard => "难",
            Self::VeryHard => "很难",
        }
    }

    /// Parse from a bank label.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "易" => Some(Self::Easy),
            "中" => Some(Self::Medium),
            "难" => Some(Self::Hard),
            "很难" => Some(Self::VeryHard),
            _ => None,
        }
    }

    /// Numeric level, 1 (easiest) through 4.
    pub fn level(&self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
            Self::VeryHard => 4,
        }
    }
}

/// Question type labels as they appear in the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    FillBlank,
    Programming,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleChoice => "单选题",
            Self::MultipleChoice => "多选题",
            Self::TrueFalse => "判断题",
            Self::FillBlank => "填空题",
            Self::Programming => "编程题",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "单选题" => Some(Self::SingleChoice),
            "多选题" => Some(Self::MultipleChoice),
            "判断题" => Some(Self::TrueFalse),
            "填空题" => Some(Self::FillBlank),
            "编程题" => Some(Self::Programming),
            _ => None,
        }
    }
}

/// A question from the bank. Immutable once loaded; replaced wholesale on
/// CSV reimport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub stem: String,
    /// Canonical answer as a letter set, e.g. "AC".
    pub answer: String,
    pub difficulty: Option<String>,
    pub qtype: Option<String>,
    pub category: Option<String>,
    /// Option letter -> option text. Empty for questions without options.
    pub options: BTreeMap<String, String>,
}

impl Question {
    /// Numeric difficulty level; unlabeled questions count as medium.
    pub fn difficulty_level(&self) -> u8 {
        self.difficulty
            .as_deref()
            .and_then(Difficulty::from_label)
            .map(|d| d.level())
            .unwrap_or(2)
    }
}

/// One attempt from a user's answer history. Append-only; a user may
/// re-answer the same question any number of times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub answer: String,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}

/// Derived learning progress; recomputed per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningProgress {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub correct_count: usize,
    pub wrong_count: usize,
    /// Accuracy over all attempts, 0-100.
    pub accuracy_rate: f64,
    pub current_seq_qid: Option<String>,
}

impl LearningProgress {
    /// Share of distinct questions answered, 0-100.
    pub fn completion_rate(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.answered_questions as f64 / self.total_questions as f64 * 100.0
    }
}

/// Per-bucket attempt counts with derived accuracy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub total: usize,
    pub correct: usize,
    /// 0-100; zero for empty buckets.
    pub accuracy: f64,
}

impl BucketStats {
    pub fn from_counts(total: usize, correct: usize) -> Self {
        let accuracy = if total > 0 {
            correct as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total,
            correct,
            accuracy,
        }
    }
}

/// A scored question recommendation; ephemeral, cached briefly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub question_id: String,
    /// 0-100.
    pub score: f64,
    pub reason: String,
    /// 1 = high, 2 = medium, 3 = low.
    pub priority: u8,
}

impl Recommendation {
    /// Ranking order: priority ascending, then score descending.
    pub fn ranking_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority.cmp(&other.priority).then(
            other
                .score
                .partial_cmp(&self.score)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    }
}

//! Core learning-analysis library shared by the exam platform backend.
//!
//! Provides:
//! - Question bank CSV parser with encoding fallback
//! - Statistics and progress analyzers over a user's answer history
//! - Heuristic question recommendation engine
//! - Answer grading for multiple-choice letter sets
//! - TTL cache for memoizing per-user reports
//! - Shared types (Question, AnswerRecord, Recommendation, etc.)

pub mod analysis;
pub mod cache;
pub mod error;
pub mod grading;
pub mod parser;
pub mod recommend;
pub mod types;

pub use analysis::{
    Analyzer, LearningSnapshot, ProgressReport, ProgressTracker, StatisticsAnalyzer,
    StatisticsReport, TrendPoint, WeakArea,
};
pub use cache::{CacheStats, TtlCache};
pub use error::{ImportError, Result};
pub use grading::{is_correct, join_choices, normalize_answer};
pub use parser::{decode_bank, parse_bank, ParsedBank, RowError};
pub use recommend::RecommendationEngine;
pub use types::{
    AnswerRecord, BucketStats, Difficulty, LearningProgress, Question, QuestionType,
    Recommendation,
};

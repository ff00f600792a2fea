//! Database models and API types

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Re-export shared types from learning-core
pub use learning_core::types::{
    AnswerRecord, BucketStats, Difficulty, LearningProgress, Question, QuestionType,
    Recommendation,
};

// === Database Entity Types ===

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub current_seq_qid: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Question stored in SQLite
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuestion {
    pub id: String,
    pub stem: String,
    pub answer: String,
    pub difficulty: Option<String>,
    pub qtype: Option<String>,
    pub category: Option<String>,
    /// JSON object, letter -> text
    pub options: String,
    pub created_at: DateTime<Utc>,
}

impl DbQuestion {
    /// Convert to the core question type
    pub fn to_core(&self) -> Question {
        Question {
            id: self.id.clone(),
            stem: self.stem.clone(),
            answer: self.answer.clone(),
            difficulty: self.difficulty.clone(),
            qtype: self.qtype.clone(),
            category: self.category.clone(),
            options: serde_json::from_str(&self.options).unwrap_or_default(),
        }
    }

    /// Public view without the canonical answer
    pub fn to_view(&self) -> QuestionView {
        QuestionView {
            id: self.id.clone(),
            stem: self.stem.clone(),
            difficulty: self.difficulty.clone(),
            qtype: self.qtype.clone(),
            category: self.category.clone(),
            options: serde_json::from_str(&self.options).unwrap_or_default(),
        }
    }
}

/// Answer history row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub question_id: String,
    pub user_answer: String,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}

impl HistoryRow {
    pub fn to_record(&self) -> AnswerRecord {
        AnswerRecord {
            question_id: self.question_id.clone(),
            answer: self.user_answer.clone(),
            correct: self.correct,
            timestamp: self.timestamp,
        }
    }
}

/// Favorite joined to its question
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FavoriteEntry {
    pub question_id: String,
    pub stem: String,
    pub difficulty: Option<String>,
    pub qtype: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Exam or timed-mode session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamSessionRow {
    pub id: i64,
    pub user_id: i64,
    pub mode: String,
    /// JSON list of question ids
    pub question_ids: String,
    pub start_time: DateTime<Utc>,
    pub duration: i64,
    pub completed: bool,
    pub score: Option<f64>,
}

impl ExamSessionRow {
    pub fn question_id_list(&self) -> Vec<String> {
        serde_json::from_str(&self.question_ids).unwrap_or_default()
    }
}

/// GROUP BY bucket from statistics queries
#[derive(Debug, Clone, FromRow)]
pub struct LabelCounts {
    pub label: Option<String>,
    pub total: i64,
    pub correct: i64,
}

/// Most-wrong question row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WrongCount {
    pub question_id: String,
    pub stem: String,
    pub wrong_times: i64,
}

// === API Request/Response Types ===

/// Question as served to clients; the canonical answer stays server-side
/// until grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub stem: String,
    pub difficulty: Option<String>,
    pub qtype: Option<String>,
    pub category: Option<String>,
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// Quiz types

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomQuestionResponse {
    /// None once the user has answered every question
    pub question: Option<QuestionView>,
    pub is_favorite: bool,
    pub answered: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionDetailResponse {
    pub question: QuestionView,
    pub is_favorite: bool,
    pub answered: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    /// Selected option letters
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    pub submitted: String,
    pub correct_answer: String,
    pub answered: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SequentialQuestionResponse {
    pub question: QuestionView,
    /// True when the bank was exhausted and the cursor wrapped to the start
    pub wrapped: bool,
    pub is_favorite: bool,
    pub answered: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SequentialAnswerResponse {
    pub correct: bool,
    pub submitted: String,
    pub correct_answer: String,
    pub next_qid: Option<String>,
    pub wrapped: bool,
    pub answered: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WrongListResponse {
    pub questions: Vec<QuestionView>,
}

// Exam types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamMode {
    Timed,
    Exam,
}

impl ExamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timed => "timed",
            Self::Exam => "exam",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartExamRequest {
    pub mode: ExamMode,
    pub question_count: Option<u32>,
    /// Timed mode only
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartExamResponse {
    pub exam_id: i64,
    pub mode: ExamMode,
    pub question_count: usize,
    pub duration_secs: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentExamResponse {
    pub exam_id: i64,
    pub mode: String,
    pub questions: Vec<QuestionView>,
    /// None for untimed exams
    pub remaining_secs: Option<i64>,
    pub expired: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamRequest {
    /// question id -> selected option letters
    pub answers: HashMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionResult {
    pub id: String,
    pub stem: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamResponse {
    pub correct_count: usize,
    pub total: usize,
    pub score: f64,
    pub results: Vec<QuestionResult>,
}

// Browse types

#[derive(Debug, Serialize, Deserialize)]
pub struct BrowseQuery {
    pub page: Option<u32>,
    pub qtype: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BrowseQuestion {
    pub id: String,
    pub stem: String,
    pub answer: String,
    pub difficulty: Option<String>,
    pub qtype: Option<String>,
    pub category: Option<String>,
    pub options: BTreeMap<String, String>,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BrowseResponse {
    pub questions: Vec<BrowseQuestion>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub available_types: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelsResponse {
    pub categories: Vec<String>,
    pub difficulties: Vec<String>,
    pub types: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct FilterItem {
    pub id: String,
    pub stem: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterResponse {
    pub questions: Vec<FilterItem>,
}

// Favorites types

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteRequest {
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteListResponse {
    pub favorites: Vec<FavoriteEntry>,
}

// Statistics & learning types

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelBreakdown {
    pub label: String,
    pub total: i64,
    pub correct: i64,
    pub accuracy: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: i64,
    pub mode: String,
    pub start_time: DateTime<Utc>,
    pub score: Option<f64>,
    pub question_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub overall_accuracy: f64,
    pub difficulty_stats: Vec<LabelBreakdown>,
    pub category_stats: Vec<LabelBreakdown>,
    pub worst_questions: Vec<WrongCount>,
    pub recent_exams: Vec<ExamSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationQuery {
    pub count: Option<usize>,
    /// Any value busts the cached statistics first
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrendQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetHistoryResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub loaded: usize,
    pub errors: Vec<String>,
    pub encoding: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_question_parses_options_json() {
        let q = DbQuestion {
            id: "1".into(),
            stem: "stem".into(),
            answer: "A".into(),
            difficulty: Some("易".into()),
            qtype: Some("单选题".into()),
            category: Some("misc".into()),
            options: r#"{"A":"one","B":"two"}"#.into(),
            created_at: Utc::now(),
        };
        let core = q.to_core();
        assert_eq!(core.options.len(), 2);
        assert_eq!(core.options["A"], "one");
    }

    #[test]
    fn malformed_options_fall_back_to_empty() {
        let q = DbQuestion {
            id: "1".into(),
            stem: "stem".into(),
            answer: "A".into(),
            difficulty: None,
            qtype: None,
            category: None,
            options: "not json".into(),
            created_at: Utc::now(),
        };
        assert!(q.to_core().options.is_empty());
        assert!(q.to_view().options.is_empty());
    }

    #[test]
    fn exam_session_parses_question_id_list() {
        let row = ExamSessionRow {
            id: 1,
            user_id: 1,
            mode: "timed".into(),
            question_ids: r#"["3","1","7"]"#.into(),
            start_time: Utc::now(),
            duration: 600,
            completed: false,
            score: None,
        };
        assert_eq!(row.question_id_list(), vec!["3", "1", "7"]);
    }
}

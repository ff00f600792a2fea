//! SQLite database operations

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory database on a single connection, for tests
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?, ?, ?)
            RETURNING id, username, password_hash, current_seq_qid, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, current_seq_qid, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by id
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, current_seq_qid, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update the sequential-mode cursor
    pub async fn set_sequential_cursor(&self, user_id: i64, qid: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET current_seq_qid = ?
            WHERE id = ?
            "#,
        )
        .bind(qid)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Session Repository ===

    /// Create a login session and return its bearer token
    pub async fn create_session(&self, user_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    /// Resolve a bearer token to its user
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.password_hash, u.current_seq_qid, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Delete a session token
    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Question Repository ===

    /// Total question count
    pub async fn count_questions(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Get question by id
    pub async fn get_question(&self, qid: &str) -> Result<Option<DbQuestion>> {
        let question = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT id, stem, answer, difficulty, qtype, category, options, created_at
            FROM questions
            WHERE id = ?
            "#,
        )
        .bind(qid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    /// All questions, in numeric id order
    pub async fn all_questions(&self) -> Result<Vec<DbQuestion>> {
        let questions = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT id, stem, answer, difficulty, qtype, category, options, created_at
            FROM questions
            ORDER BY CAST(id AS INTEGER) ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    /// Upsert a question (reimport replaces wholesale by id)
    pub async fn upsert_question(&self, question: &Question) -> Result<()> {
        let options =
            serde_json::to_string(&question.options).unwrap_or_else(|_| "{}".to_string());
        sqlx::query(
            r#"
            INSERT INTO questions (id, stem, answer, difficulty, qtype, category, options, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                stem = EXCLUDED.stem,
                answer = EXCLUDED.answer,
                difficulty = EXCLUDED.difficulty,
                qtype = EXCLUDED.qtype,
                category = EXCLUDED.category,
                options = EXCLUDED.options
            "#,
        )
        .bind(&question.id)
        .bind(&question.stem)
        .bind(&question.answer)
        .bind(&question.difficulty)
        .bind(&question.qtype)
        .bind(&question.category)
        .bind(options)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Random question the user has not answered yet
    pub async fn random_unanswered_id(&self, user_id: i64) -> Result<Option<String>> {
        let qid: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE id NOT IN (
                SELECT question_id FROM history WHERE user_id = ?
            )
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(qid)
    }

    /// N random question ids, for exam assembly
    pub async fn random_question_ids(&self, count: i64) -> Result<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM questions ORDER BY RANDOM() LIMIT ?")
                .bind(count)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    /// First question in numeric id order
    pub async fn first_question_id(&self) -> Result<Option<String>> {
        let qid: Option<String> = sqlx::query_scalar(
            "SELECT id FROM questions ORDER BY CAST(id AS INTEGER) ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(qid)
    }

    /// First unanswered question in numeric id order
    pub async fn first_unanswered_id(&self, user_id: i64) -> Result<Option<String>> {
        let qid: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE id NOT IN (
                SELECT question_id FROM history WHERE user_id = ?
            )
            ORDER BY CAST(id AS INTEGER) ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(qid)
    }

    /// Next unanswered question with a higher numeric id
    pub async fn next_unanswered_after(
        &self,
        user_id: i64,
        current: i64,
    ) -> Result<Option<String>> {
        let qid: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE CAST(id AS INTEGER) > ?
              AND id NOT IN (
                  SELECT question_id FROM history WHERE user_id = ?
              )
            ORDER BY CAST(id AS INTEGER) ASC
            LIMIT 1
            "#,
        )
        .bind(current)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(qid)
    }

    fn browse_filter<'a>(
        builder: &mut QueryBuilder<'a, Sqlite>,
        qtype: Option<&'a str>,
        search: Option<&'a str>,
    ) {
        let mut first = true;
        if let Some(qtype) = qtype {
            builder.push(" WHERE qtype = ").push_bind(qtype);
            first = false;
        }
        if let Some(search) = search {
            builder.push(if first { " WHERE " } else { " AND " });
            let pattern = format!("%{search}%");
            builder
                .push("(stem LIKE ")
                .push_bind(pattern.clone())
                .push(" OR id LIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// Page of questions with optional type filter and stem/id search
    pub async fn browse_questions(
        &self,
        qtype: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DbQuestion>> {
        let mut builder = QueryBuilder::new(
            "SELECT id, stem, answer, difficulty, qtype, category, options, created_at FROM questions",
        );
        Self::browse_filter(&mut builder, qtype, search);
        builder
            .push(" ORDER BY CAST(id AS INTEGER) ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let questions = builder
            .build_query_as::<DbQuestion>()
            .fetch_all(&self.pool)
            .await?;

        Ok(questions)
    }

    /// Question count matching the browse filter
    pub async fn count_browse_questions(
        &self,
        qtype: Option<&str>,
        search: Option<&str>,
    ) -> Result<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM questions");
        Self::browse_filter(&mut builder, qtype, search);

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Distinct non-empty question types
    pub async fn distinct_types(&self) -> Result<Vec<String>> {
        let types: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT qtype FROM questions WHERE qtype IS NOT NULL AND qtype != '' ORDER BY qtype",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    /// Distinct non-empty categories
    pub async fn distinct_categories(&self) -> Result<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM questions WHERE category IS NOT NULL AND category != '' ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Distinct non-empty difficulties
    pub async fn distinct_difficulties(&self) -> Result<Vec<String>> {
        let difficulties: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT difficulty FROM questions WHERE difficulty IS NOT NULL AND difficulty != '' ORDER BY difficulty",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(difficulties)
    }

    /// Filter questions by category and/or difficulty
    pub async fn filter_questions(
        &self,
        category: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<Vec<FilterItem>> {
        let mut builder = QueryBuilder::new("SELECT id, stem FROM questions WHERE 1=1");
        if let Some(category) = category {
            builder.push(" AND category = ").push_bind(category);
        }
        if let Some(difficulty) = difficulty {
            builder.push(" AND difficulty = ").push_bind(difficulty);
        }
        builder.push(" ORDER BY CAST(id AS INTEGER) ASC");

        let items = builder
            .build_query_as::<FilterItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    // === History Repository ===

    /// Append one attempt
    pub async fn insert_attempt(
        &self,
        user_id: i64,
        question_id: &str,
        user_answer: &str,
        correct: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO history (user_id, question_id, user_answer, correct, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(user_answer)
        .bind(correct)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All attempts for a user, newest first
    pub async fn user_history(&self, user_id: i64) -> Result<Vec<HistoryRow>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, user_id, question_id, user_answer, correct, timestamp
            FROM history
            WHERE user_id = ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Distinct answered question count
    pub async fn answered_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT question_id) FROM history WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Distinct ids of questions the user answered wrong
    pub async fn wrong_question_ids(&self, user_id: i64) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT question_id FROM history WHERE user_id = ? AND correct = 0",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// One random previously-wrong question id
    pub async fn random_wrong_id(&self, user_id: i64) -> Result<Option<String>> {
        let qid: Option<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT question_id FROM history
            WHERE user_id = ? AND correct = 0
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(qid)
    }

    /// Delete a user's entire history
    pub async fn reset_history(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM history WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // === Favorites Repository ===

    /// Add a favorite; returns false if the pair already exists
    pub async fn add_favorite(
        &self,
        user_id: i64,
        question_id: &str,
        tag: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, question_id, tag, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, question_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(tag)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a favorite
    pub async fn remove_favorite(&self, user_id: i64, question_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND question_id = ?")
            .bind(user_id)
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Update the tag on an existing favorite
    pub async fn set_favorite_tag(
        &self,
        user_id: i64,
        question_id: &str,
        tag: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE favorites SET tag = ? WHERE user_id = ? AND question_id = ?",
        )
        .bind(tag)
        .bind(user_id)
        .bind(question_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the pair exists
    pub async fn is_favorite(&self, user_id: i64, question_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM favorites WHERE user_id = ? AND question_id = ?",
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    /// Ids of all favorited questions for a user
    pub async fn favorite_ids(&self, user_id: i64) -> Result<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT question_id FROM favorites WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    /// Favorites joined to their questions, newest first
    pub async fn list_favorites(&self, user_id: i64) -> Result<Vec<FavoriteEntry>> {
        let entries = sqlx::query_as::<_, FavoriteEntry>(
            r#"
            SELECT f.question_id, q.stem, q.difficulty, q.qtype, q.category,
                   f.tag, f.created_at
            FROM favorites f
            JOIN questions q ON q.id = f.question_id
            WHERE f.user_id = ?
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // === Exam Session Repository ===

    /// Create an exam session and return its id
    pub async fn create_exam_session(
        &self,
        user_id: i64,
        mode: &str,
        question_ids: &[String],
        start_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Result<i64> {
        let ids = serde_json::to_string(question_ids).unwrap_or_else(|_| "[]".to_string());
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO exam_sessions (user_id, mode, question_ids, start_time, duration)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(mode)
        .bind(ids)
        .bind(start_time)
        .bind(duration_secs)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Latest uncompleted session for the user
    pub async fn current_exam_session(&self, user_id: i64) -> Result<Option<ExamSessionRow>> {
        let session = sqlx::query_as::<_, ExamSessionRow>(
            r#"
            SELECT id, user_id, mode, question_ids, start_time, duration, completed, score
            FROM exam_sessions
            WHERE user_id = ? AND completed = 0
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Mark a session completed with its score
    pub async fn complete_exam_session(&self, session_id: i64, score: f64) -> Result<()> {
        sqlx::query("UPDATE exam_sessions SET completed = 1, score = ? WHERE id = ?")
            .bind(score)
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Most recent completed sessions
    pub async fn recent_completed_exams(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ExamSessionRow>> {
        let sessions = sqlx::query_as::<_, ExamSessionRow>(
            r#"
            SELECT id, user_id, mode, question_ids, start_time, duration, completed, score
            FROM exam_sessions
            WHERE user_id = ? AND completed = 1
            ORDER BY start_time DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    // === Statistics Queries ===

    /// Total and correct attempt counts
    pub async fn overall_counts(&self, user_id: i64) -> Result<(i64, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(correct), 0)
            FROM history
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Attempt counts grouped by question difficulty
    pub async fn difficulty_breakdown(&self, user_id: i64) -> Result<Vec<LabelCounts>> {
        let rows = sqlx::query_as::<_, LabelCounts>(
            r#"
            SELECT q.difficulty AS label, COUNT(*) AS total,
                   COALESCE(SUM(h.correct), 0) AS correct
            FROM history h
            JOIN questions q ON h.question_id = q.id
            WHERE h.user_id = ?
            GROUP BY q.difficulty
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Attempt counts grouped by question category
    pub async fn category_breakdown(&self, user_id: i64) -> Result<Vec<LabelCounts>> {
        let rows = sqlx::query_as::<_, LabelCounts>(
            r#"
            SELECT q.category AS label, COUNT(*) AS total,
                   COALESCE(SUM(h.correct), 0) AS correct
            FROM history h
            JOIN questions q ON h.question_id = q.id
            WHERE h.user_id = ?
            GROUP BY q.category
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Questions the user gets wrong most often
    pub async fn most_wrong_questions(&self, user_id: i64, limit: i64) -> Result<Vec<WrongCount>> {
        let rows = sqlx::query_as::<_, WrongCount>(
            r#"
            SELECT h.question_id, q.stem, COUNT(*) AS wrong_times
            FROM history h
            JOIN questions q ON h.question_id = q.id
            WHERE h.user_id = ? AND h.correct = 0
            GROUP BY h.question_id
            ORDER BY wrong_times DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

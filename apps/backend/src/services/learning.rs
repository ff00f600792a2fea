//! Learning service: loads snapshots from storage, runs the core analyzers
//! and memoizes per-user reports in the shared TTL cache.

use chrono::Utc;

use learning_core::analysis::{
    Analyzer, LearningSnapshot, ProgressReport, ProgressTracker, StatisticsAnalyzer,
    StatisticsReport, TrendPoint,
};
use learning_core::cache::{CacheStats, TtlCache};
use learning_core::recommend::RecommendationEngine;
use learning_core::types::Recommendation;

use crate::db::Database;
use crate::error::Result;

/// Memoized report variants sharing one cache map.
#[derive(Clone)]
enum CachedReport {
    Progress(ProgressReport),
    Statistics(StatisticsReport),
}

fn progress_key(user_id: i64) -> String {
    format!("progress:{user_id}")
}

fn statistics_key(user_id: i64) -> String {
    format!("statistics:{user_id}")
}

/// Facade over the analyzers, the recommendation engine and the cache.
pub struct LearningService {
    stats_analyzer: StatisticsAnalyzer,
    progress_tracker: ProgressTracker,
    engine: RecommendationEngine,
    cache: TtlCache<CachedReport>,
}

impl Default for LearningService {
    fn default() -> Self {
        Self {
            stats_analyzer: StatisticsAnalyzer::default(),
            progress_tracker: ProgressTracker,
            engine: RecommendationEngine::default(),
            cache: TtlCache::with_defaults(),
        }
    }
}

impl LearningService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the question bank and one user's history into a snapshot.
    async fn snapshot(&self, db: &Database, user_id: i64) -> Result<LearningSnapshot> {
        let questions = db
            .all_questions()
            .await?
            .iter()
            .map(|q| q.to_core())
            .collect();
        let attempts = db
            .user_history(user_id)
            .await?
            .iter()
            .map(|row| row.to_record())
            .collect();
        let current_seq_qid = db
            .get_user_by_id(user_id)
            .await?
            .and_then(|user| user.current_seq_qid);

        Ok(LearningSnapshot {
            questions,
            attempts,
            current_seq_qid,
        })
    }

    /// Progress report, cached per user.
    pub async fn progress(&self, db: &Database, user_id: i64) -> Result<ProgressReport> {
        let key = progress_key(user_id);
        if let Some(CachedReport::Progress(report)) = self.cache.get(&key) {
            return Ok(report);
        }

        let snapshot = self.snapshot(db, user_id).await?;
        let report = self.progress_tracker.analyze(&snapshot);
        self.cache.insert(key, CachedReport::Progress(report.clone()));
        Ok(report)
    }

    /// Statistics report, cached per user.
    pub async fn statistics(&self, db: &Database, user_id: i64) -> Result<StatisticsReport> {
        let key = statistics_key(user_id);
        if let Some(CachedReport::Statistics(report)) = self.cache.get(&key) {
            return Ok(report);
        }

        let snapshot = self.snapshot(db, user_id).await?;
        let report = self.stats_analyzer.analyze(&snapshot);
        self.cache
            .insert(key, CachedReport::Statistics(report.clone()));
        Ok(report)
    }

    /// Ranked recommendations over unanswered questions. `refresh` busts the
    /// cached statistics first.
    pub async fn recommendations(
        &self,
        db: &Database,
        user_id: i64,
        count: usize,
        refresh: bool,
    ) -> Result<Vec<Recommendation>> {
        if refresh {
            self.invalidate_user(user_id);
        }

        let snapshot = self.snapshot(db, user_id).await?;
        let key = statistics_key(user_id);
        let stats = match self.cache.get(&key) {
            Some(CachedReport::Statistics(report)) => report,
            _ => {
                let report = self.stats_analyzer.analyze(&snapshot);
                self.cache
                    .insert(key, CachedReport::Statistics(report.clone()));
                report
            }
        };

        let mut rng = rand::thread_rng();
        Ok(self.engine.recommend(&snapshot, &stats, count, &mut rng))
    }

    /// Wrong-question review recommendations.
    pub async fn wrong_recommendations(
        &self,
        db: &Database,
        user_id: i64,
        count: usize,
    ) -> Result<Vec<Recommendation>> {
        let snapshot = self.snapshot(db, user_id).await?;
        Ok(self.engine.recommend_wrong(&snapshot, count, Utc::now()))
    }

    /// Daily trend over the trailing window.
    pub async fn trend(&self, db: &Database, user_id: i64, days: u32) -> Result<Vec<TrendPoint>> {
        let snapshot = self.snapshot(db, user_id).await?;
        Ok(self
            .progress_tracker
            .learning_trend(&snapshot, days, Utc::now()))
    }

    /// Drop a user's cached reports.
    pub fn invalidate_user(&self, user_id: i64) {
        self.cache.remove(&progress_key(user_id));
        self.cache.remove(&statistics_key(user_id));
    }

    /// Drop everything, e.g. after a question bank reimport.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

//! Heuristic question recommendation engine.
//!
//! Scores every unanswered question from the user's statistics report:
//! weak-category, weak-difficulty and weak-type bonuses on a fixed base,
//! a small random jitter so repeated calls vary, clamped to [0, 100].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::analysis::{LearningSnapshot, StatisticsReport};
use crate::types::Recommendation;

/// Recommendation engine with configurable weights.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    pub base_score: f64,
    pub weak_area_bonus: f64,
    pub difficulty_bonus: f64,
    pub type_bonus: f64,
    /// Difficulty buckets below this accuracy earn the bonus.
    pub difficulty_threshold: f64,
    /// Type buckets below this accuracy earn the bonus.
    pub type_threshold: f64,
    /// Jitter is drawn uniformly from [-jitter, jitter].
    pub jitter: f64,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            base_score: 50.0,
            weak_area_bonus: 30.0,
            difficulty_bonus: 20.0,
            type_bonus: 15.0,
            difficulty_threshold: 60.0,
            type_threshold: 70.0,
            jitter: 5.0,
        }
    }
}

impl RecommendationEngine {
    /// Recommend up to `count` unanswered questions, best first.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        snapshot: &LearningSnapshot,
        stats: &StatisticsReport,
        count: usize,
        rng: &mut R,
    ) -> Vec<Recommendation> {
        let answered = snapshot.answered_ids();

        let mut recommendations: Vec<Recommendation> = snapshot
            .questions
            .iter()
            .filter(|q| !answered.contains(q.id.as_str()))
            .map(|question| {
                let jitter = rng.gen_range(-self.jitter..=self.jitter);
                let score = self.score_question(question, stats, jitter);
                Recommendation {
                    question_id: question.id.clone(),
                    score,
                    reason: self.reason_for(question, stats),
                    priority: Self::priority_for(score),
                }
            })
            .collect();

        recommendations.sort_by(Recommendation::ranking_cmp);
        recommendations.truncate(count);
        recommendations
    }

    /// Score one question against the statistics report. Jitter is passed in
    /// so the additive part stays deterministic and testable.
    pub fn score_question(
        &self,
        question: &crate::types::Question,
        stats: &StatisticsReport,
        jitter: f64,
    ) -> f64 {
        let mut score = self.base_score;

        if self.in_weak_area(question, stats) {
            score += self.weak_area_bonus;
        }
        if self.below_difficulty_threshold(question, stats) {
            score += self.difficulty_bonus;
        }
        if let Some(qtype) = &question.qtype {
            if let Some(bucket) = stats.type_stats.get(qtype) {
                if bucket.accuracy < self.type_threshold {
                    score += self.type_bonus;
                }
            }
        }

        (score + jitter).clamp(0.0, 100.0)
    }

    /// Recommend previously-wrong questions for review: score grows with the
    /// error count and with days since the most recent error.
    pub fn recommend_wrong(
        &self,
        snapshot: &LearningSnapshot,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let mut errors: HashMap<&str, (usize, DateTime<Utc>)> = HashMap::new();
        for attempt in snapshot.attempts.iter().filter(|a| !a.correct) {
            let entry = errors
                .entry(attempt.question_id.as_str())
                .or_insert((0, attempt.timestamp));
            entry.0 += 1;
            if attempt.timestamp > entry.1 {
                entry.1 = attempt.timestamp;
            }
        }

        let index = snapshot.question_index();
        let mut recommendations: Vec<Recommendation> = errors
            .into_iter()
            .filter(|(qid, _)| index.contains_key(qid))
            .map(|(qid, (error_count, last_error))| {
                let days_since = (now - last_error).num_days().max(0) as f64;
                let score = (error_count as f64 * 20.0 + days_since * 2.0).min(100.0);
                Recommendation {
                    question_id: qid.to_string(),
                    score,
                    reason: format!("answered wrong {error_count} times, worth revisiting"),
                    priority: if error_count >= 2 { 1 } else { 2 },
                }
            })
            .collect();

        recommendations.sort_by(Recommendation::ranking_cmp);
        recommendations.truncate(count);
        recommendations
    }

    fn in_weak_area(&self, question: &crate::types::Question, stats: &StatisticsReport) -> bool {
        question
            .category
            .as_deref()
            .is_some_and(|cat| stats.weak_areas.iter().any(|w| w.category == cat))
    }

    fn below_difficulty_threshold(
        &self,
        question: &crate::types::Question,
        stats: &StatisticsReport,
    ) -> bool {
        question
            .difficulty
            .as_deref()
            .and_then(|d| stats.difficulty_stats.get(d))
            .is_some_and(|bucket| bucket.accuracy < self.difficulty_threshold)
    }

    fn reason_for(&self, question: &crate::types::Question, stats: &StatisticsReport) -> String {
        let mut reasons = Vec::new();
        if self.in_weak_area(question, stats) {
            if let Some(cat) = &question.category {
                reasons.push(format!("weak category: {cat}"));
            }
        }
        if self.below_difficulty_threshold(question, stats) {
            reasons.push("low accuracy at this difficulty".to_string());
        }
        if reasons.is_empty() {
            reasons.push("picked from your unanswered questions".to_string());
        }
        reasons.join("; ")
    }

    fn priority_for(score: f64) -> u8 {
        if score >= 70.0 {
            1
        } else if score >= 50.0 {
            2
        } else {
            3
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analyzer, StatisticsAnalyzer};
    use crate::types::{AnswerRecord, Question};
    use chrono::Duration;
    use rand::rngs::mock::StepRng;
    use std::collections::BTreeMap;

    fn question(id: &str, difficulty: &str, category: &str, qtype: &str) -> Question {
        Question {
            id: id.into(),
            stem: format!("stem {id}"),
            answer: "A".into(),
            difficulty: Some(difficulty.into()),
            qtype: Some(qtype.into()),
            category: Some(category.into()),
            options: BTreeMap::new(),
        }
    }

    fn attempt(qid: &str, correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: qid.into(),
            answer: "B".into(),
            correct,
            timestamp: Utc::now(),
        }
    }

    /// Snapshot where category "weak" and difficulty "难" both underperform.
    fn weak_snapshot() -> LearningSnapshot {
        LearningSnapshot {
            questions: vec![
                question("1", "难", "weak", "多选题"),
                question("2", "难", "weak", "多选题"),
                question("3", "难", "weak", "多选题"),
                question("4", "易", "strong", "单选题"),
                // Unanswered candidates.
                question("5", "难", "weak", "多选题"),
                question("6", "易", "strong", "单选题"),
            ],
            attempts: vec![
                attempt("1", false),
                attempt("2", false),
                attempt("3", false),
                attempt("4", true),
            ],
            current_seq_qid: None,
        }
    }

    #[test]
    fn scores_stay_within_bounds() {
        let engine = RecommendationEngine::default();
        let snapshot = weak_snapshot();
        let stats = StatisticsAnalyzer::default().analyze(&snapshot);

        for q in &snapshot.questions {
            for jitter in [-5.0, 0.0, 5.0] {
                let score = engine.score_question(q, &stats, jitter);
                assert!((0.0..=100.0).contains(&score), "score {score} out of range");
            }
        }
        // Every bonus plus max jitter would exceed 100 without the clamp.
        let loaded = engine.score_question(&snapshot.questions[4], &stats, 5.0);
        assert_eq!(loaded, 100.0);
    }

    #[test]
    fn weak_buckets_raise_scores() {
        let engine = RecommendationEngine::default();
        let snapshot = weak_snapshot();
        let stats = StatisticsAnalyzer::default().analyze(&snapshot);

        let weak_q = &snapshot.questions[4];
        let strong_q = &snapshot.questions[5];
        assert!(engine.score_question(weak_q, &stats, 0.0) > engine.score_question(strong_q, &stats, 0.0));
        assert!(engine
            .reason_for(weak_q, &stats)
            .contains("weak category: weak"));
    }

    #[test]
    fn recommend_excludes_answered_questions() {
        let engine = RecommendationEngine::default();
        let snapshot = weak_snapshot();
        let stats = StatisticsAnalyzer::default().analyze(&snapshot);
        let mut rng = StepRng::new(0, 1);

        let recs = engine.recommend(&snapshot, &stats, 10, &mut rng);
        let ids: Vec<_> = recs.iter().map(|r| r.question_id.as_str()).collect();
        assert!(!ids.contains(&"1"));
        assert!(ids.contains(&"5"));
        assert!(ids.contains(&"6"));
    }

    #[test]
    fn recommendations_rank_priority_then_score() {
        let engine = RecommendationEngine::default();
        let snapshot = weak_snapshot();
        let stats = StatisticsAnalyzer::default().analyze(&snapshot);
        let mut rng = StepRng::new(0, 1);

        let recs = engine.recommend(&snapshot, &stats, 10, &mut rng);
        for pair in recs.windows(2) {
            assert!(pair[0].ranking_cmp(&pair[1]) != std::cmp::Ordering::Greater);
        }
        // The weak-everything question outranks the strong one.
        assert_eq!(recs[0].question_id, "5");
    }

    #[test]
    fn wrong_recommendations_score_by_errors_and_staleness() {
        let now = Utc::now();
        let snapshot = LearningSnapshot {
            questions: vec![
                question("1", "中", "c", "单选题"),
                question("2", "中", "c", "单选题"),
            ],
            attempts: vec![
                // "1" wrong twice, most recently 10 days ago.
                AnswerRecord {
                    question_id: "1".into(),
                    answer: "B".into(),
                    correct: false,
                    timestamp: now - Duration::days(10),
                },
                AnswerRecord {
                    question_id: "1".into(),
                    answer: "B".into(),
                    correct: false,
                    timestamp: now - Duration::days(20),
                },
                // "2" wrong once, yesterday.
                AnswerRecord {
                    question_id: "2".into(),
                    answer: "B".into(),
                    correct: false,
                    timestamp: now - Duration::days(1),
                },
            ],
            current_seq_qid: None,
        };

        let engine = RecommendationEngine::default();
        let recs = engine.recommend_wrong(&snapshot, 5, now);
        assert_eq!(recs.len(), 2);
        // Repeat offender gets priority 1 and scores 2*20 + 10*2 = 60.
        assert_eq!(recs[0].question_id, "1");
        assert_eq!(recs[0].priority, 1);
        assert_eq!(recs[0].score, 60.0);
        assert_eq!(recs[1].priority, 2);
        assert_eq!(recs[1].score, 22.0);
    }

    #[test]
    fn wrong_recommendation_scores_cap_at_hundred() {
        let now = Utc::now();
        let mut attempts = Vec::new();
        for _ in 0..10 {
            attempts.push(AnswerRecord {
                question_id: "1".into(),
                answer: "B".into(),
                correct: false,
                timestamp: now,
            });
        }
        let snapshot = LearningSnapshot {
            questions: vec![question("1", "中", "c", "单选题")],
            attempts,
            current_seq_qid: None,
        };
        let recs = RecommendationEngine::default().recommend_wrong(&snapshot, 5, now);
        assert_eq!(recs[0].score, 100.0);
    }
}

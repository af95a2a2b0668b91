use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AttemptId, QuestionId, StudentId};
use crate::time::whole_seconds_between;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSummaryError {
    #[error("too many answers for a single quiz: {len}")]
    TooManyAnswers { len: usize },

    #[error("quiz drew {total} questions but {answered} were answered")]
    AnswerCountMismatch { total: usize, answered: usize },
}

//
// ─── ANSWER RESULT ─────────────────────────────────────────────────────────────
//

/// Outcome of one submitted answer. Created once, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: QuestionId,
    pub question: String,
    pub subject: String,
    pub topic: String,
    /// Options in the order they were shown.
    pub options: Vec<String>,
    #[serde(rename = "userAnswer")]
    pub chosen_option: String,
    #[serde(rename = "correctAnswer")]
    pub correct_option: String,
    pub is_correct: bool,
}

//
// ─── TOPIC BREAKDOWN ───────────────────────────────────────────────────────────
//

/// Correct/incorrect tallies for one topic of a finished quiz.
///
/// A topic is strong when nothing was missed and weak when nothing was right.
/// A topic with both kinds of answers is neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBreakdown {
    pub topic: String,
    pub correct: u32,
    pub incorrect: u32,
}

impl TopicBreakdown {
    #[must_use]
    pub fn is_strong(&self) -> bool {
        self.incorrect == 0
    }

    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.correct == 0
    }
}

/// Groups results by topic, in the order topics were first answered.
#[must_use]
pub fn topic_breakdown(results: &[AnswerResult]) -> Vec<TopicBreakdown> {
    let mut topics: Vec<TopicBreakdown> = Vec::new();
    for result in results {
        let idx = match topics.iter().position(|t| t.topic == result.topic) {
            Some(idx) => idx,
            None => {
                topics.push(TopicBreakdown {
                    topic: result.topic.clone(),
                    correct: 0,
                    incorrect: 0,
                });
                topics.len() - 1
            }
        };
        let entry = &mut topics[idx];
        if result.is_correct {
            entry.correct = entry.correct.saturating_add(1);
        } else {
            entry.incorrect = entry.incorrect.saturating_add(1);
        }
    }
    topics
}

//
// ─── QUIZ SUMMARY ──────────────────────────────────────────────────────────────
//

/// Final tally of a finished quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    subject: String,
    score: u32,
    total: u32,
    accuracy_percent: f64,
    elapsed_seconds: u64,
    topics: Vec<TopicBreakdown>,
    answers: Vec<AnswerResult>,
}

impl QuizSummary {
    /// Build a summary from the results of a finished quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizSummaryError::AnswerCountMismatch` if not every drawn question
    /// was answered, and `TooManyAnswers` if the counts cannot fit in `u32`.
    ///
    /// A `completed_at` before `started_at` counts as zero elapsed seconds.
    pub fn from_results(
        subject: impl Into<String>,
        total: usize,
        results: &[AnswerResult],
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizSummaryError> {
        let elapsed_seconds = whole_seconds_between(started_at, completed_at);
        if results.len() != total {
            return Err(QuizSummaryError::AnswerCountMismatch {
                total,
                answered: results.len(),
            });
        }

        let total = u32::try_from(total)
            .map_err(|_| QuizSummaryError::TooManyAnswers { len: results.len() })?;
        let correct = results.iter().filter(|r| r.is_correct).count();
        let score = u32::try_from(correct)
            .map_err(|_| QuizSummaryError::TooManyAnswers { len: results.len() })?;
        let accuracy_percent = if total == 0 {
            0.0
        } else {
            100.0 * f64::from(score) / f64::from(total)
        };

        Ok(Self {
            subject: subject.into(),
            score,
            total,
            accuracy_percent,
            elapsed_seconds,
            topics: topic_breakdown(results),
            answers: results.to_vec(),
        })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy_percent
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn topics(&self) -> &[TopicBreakdown] {
        &self.topics
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerResult] {
        &self.answers
    }

    pub fn strong_topics(&self) -> impl Iterator<Item = &str> {
        self.topics
            .iter()
            .filter(|t| t.is_strong())
            .map(|t| t.topic.as_str())
    }

    pub fn weak_topics(&self) -> impl Iterator<Item = &str> {
        self.topics
            .iter()
            .filter(|t| t.is_weak())
            .map(|t| t.topic.as_str())
    }
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

/// Payload submitted to the backend after a quiz is finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizAttempt {
    pub student_id: StudentId,
    pub subject: String,
    pub score: u32,
    pub total_questions: u32,
    /// Accuracy rounded to one decimal place.
    pub accuracy: f64,
    pub time_taken_seconds: u64,
    pub details: Vec<AnswerResult>,
}

impl QuizAttempt {
    #[must_use]
    pub fn from_summary(student_id: StudentId, summary: &QuizSummary) -> Self {
        Self {
            student_id,
            subject: summary.subject.clone(),
            score: summary.score,
            total_questions: summary.total,
            accuracy: (summary.accuracy_percent * 10.0).round() / 10.0,
            time_taken_seconds: summary.elapsed_seconds,
            details: summary.answers.clone(),
        }
    }
}

/// Colour band used when listing past attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyBand {
    High,
    Medium,
    Low,
}

impl AccuracyBand {
    #[must_use]
    pub fn classify(accuracy: f64) -> Self {
        if accuracy >= 75.0 {
            Self::High
        } else if accuracy >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A past attempt as reported by the backend history endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttemptRecord {
    pub id: AttemptId,
    pub student_id: StudentId,
    pub subject: String,
    pub score: u32,
    pub total_questions: u32,
    pub accuracy: f64,
    pub time_taken_seconds: u64,
    pub attempted_at: DateTime<Utc>,
}

impl QuizAttemptRecord {
    #[must_use]
    pub fn accuracy_band(&self) -> AccuracyBand {
        AccuracyBand::classify(self.accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn result(id: u64, topic: &str, is_correct: bool) -> AnswerResult {
        AnswerResult {
            question_id: QuestionId::new(id),
            question: format!("Q{id}"),
            subject: "Math".into(),
            topic: topic.into(),
            options: vec!["a".into(), "b".into()],
            chosen_option: if is_correct { "a".into() } else { "b".into() },
            correct_option: "a".into(),
            is_correct,
        }
    }

    #[test]
    fn summary_counts_score_and_elapsed_time() {
        let start = fixed_now();
        let results = vec![
            result(1, "Algebra", true),
            result(2, "Algebra", false),
            result(3, "Geometry", true),
            result(4, "Fractions", false),
        ];
        let summary = QuizSummary::from_results(
            "Math",
            4,
            &results,
            start,
            start + Duration::seconds(83),
        )
        .unwrap();

        assert_eq!(summary.score(), 2);
        assert_eq!(summary.total(), 4);
        assert!((summary.accuracy_percent() - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.elapsed_seconds(), 83);
        assert_eq!(summary.strong_topics().collect::<Vec<_>>(), ["Geometry"]);
        assert_eq!(summary.weak_topics().collect::<Vec<_>>(), ["Fractions"]);
    }

    #[test]
    fn mixed_topic_is_neither_strong_nor_weak() {
        let topics = topic_breakdown(&[result(1, "Algebra", true), result(2, "Algebra", false)]);
        assert_eq!(topics.len(), 1);
        assert!(!topics[0].is_strong());
        assert!(!topics[0].is_weak());
    }

    #[test]
    fn empty_quiz_has_zero_accuracy() {
        let now = fixed_now();
        let summary = QuizSummary::from_results("Math", 0, &[], now, now).unwrap();
        assert_eq!(summary.accuracy_percent(), 0.0);
        assert!(summary.topics().is_empty());
    }

    #[test]
    fn clock_stepping_back_counts_as_zero_seconds() {
        let now = fixed_now();
        let summary =
            QuizSummary::from_results("Math", 0, &[], now, now - Duration::seconds(30)).unwrap();
        assert_eq!(summary.elapsed_seconds(), 0);
    }

    #[test]
    fn unanswered_questions_are_rejected() {
        let now = fixed_now();
        let err = QuizSummary::from_results("Math", 3, &[result(1, "A", true)], now, now)
            .unwrap_err();
        assert_eq!(
            err,
            QuizSummaryError::AnswerCountMismatch {
                total: 3,
                answered: 1
            }
        );
    }

    #[test]
    fn attempt_rounds_accuracy_and_uses_backend_field_names() {
        let now = fixed_now();
        let results = vec![
            result(1, "A", true),
            result(2, "A", false),
            result(3, "B", false),
        ];
        let summary = QuizSummary::from_results("Math", 3, &results, now, now).unwrap();
        let attempt = QuizAttempt::from_summary(StudentId::new("S001").unwrap(), &summary);
        assert!((attempt.accuracy - 33.3).abs() < 1e-9);

        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["student_id"], "S001");
        assert_eq!(json["total_questions"], 3);
        assert_eq!(json["details"][1]["userAnswer"], "b");
        assert_eq!(json["details"][1]["isCorrect"], false);
    }

    #[test]
    fn accuracy_bands_follow_history_thresholds() {
        assert_eq!(AccuracyBand::classify(75.0), AccuracyBand::High);
        assert_eq!(AccuracyBand::classify(50.0), AccuracyBand::Medium);
        assert_eq!(AccuracyBand::classify(49.9), AccuracyBand::Low);
    }
}

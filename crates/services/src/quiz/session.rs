use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

use classroom_core::model::{AnswerResult, Question, QuizSummary};

use super::plan::{DrawnQuestion, QuizBuilder};
use super::progress::QuizProgress;
use crate::error::QuizError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a quiz attempt is in its question/answer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    /// Waiting for the current question to be answered.
    InProgress,
    /// The current answer has been checked and is final.
    AnswerShown,
    Finished,
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::AnswerShown => "showing an answer",
            Self::Finished => "finished",
        };
        f.write_str(label)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

struct ActiveQuiz {
    subject: String,
    pool: Vec<Question>,
    drawn: Vec<DrawnQuestion>,
    current: usize,
    selection: Option<String>,
    results: Vec<AnswerResult>,
    started_at: DateTime<Utc>,
    state: QuizState,
    summary: Option<QuizSummary>,
}

/// One quiz attempt, driven one call at a time by its single owner.
///
/// `start` → (`select_option`* → `submit_answer` → `advance`)* → `finish`.
/// Calls made in the wrong state fail with `QuizError::InvalidState` and
/// leave the session unchanged.
#[derive(Default)]
pub struct QuizSession {
    active: Option<ActiveQuiz>,
}

impl QuizSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new attempt, discarding any previous one.
    ///
    /// Draws `min(requested_count, pool size)` questions for `subject` from `bank`.
    /// An empty draw goes straight to `Finished`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestionsAvailable` if the subject has no questions;
    /// the session is left as it was.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        bank: &[Question],
        subject: &str,
        requested_count: usize,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<(), QuizError> {
        let plan = QuizBuilder::new(bank, subject)
            .with_count(requested_count)
            .build(rng)?;

        let state = if plan.drawn.is_empty() {
            QuizState::Finished
        } else {
            QuizState::InProgress
        };
        tracing::info!(
            subject = %plan.subject,
            pool = plan.pool.len(),
            drawn = plan.drawn.len(),
            "quiz started"
        );

        self.active = Some(ActiveQuiz {
            subject: plan.subject,
            pool: plan.pool,
            drawn: plan.drawn,
            current: 0,
            selection: None,
            results: Vec::new(),
            started_at,
            state,
            summary: None,
        });
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.active
            .as_ref()
            .map_or(QuizState::NotStarted, |quiz| quiz.state)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state() == QuizState::Finished
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.active.as_ref().map(|quiz| quiz.subject.as_str())
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.active.as_ref().map(|quiz| quiz.started_at)
    }

    /// Questions of the subject the draw was made from.
    #[must_use]
    pub fn pool(&self) -> &[Question] {
        self.active.as_ref().map_or(&[], |quiz| quiz.pool.as_slice())
    }

    #[must_use]
    pub fn drawn(&self) -> &[DrawnQuestion] {
        self.active.as_ref().map_or(&[], |quiz| quiz.drawn.as_slice())
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.active.as_ref().map_or(0, |quiz| quiz.current)
    }

    #[must_use]
    pub fn results(&self) -> &[AnswerResult] {
        self.active.as_ref().map_or(&[], |quiz| quiz.results.as_slice())
    }

    /// The tentatively chosen option for the current question.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.active
            .as_ref()
            .and_then(|quiz| quiz.selection.as_deref())
    }

    /// The question being answered or reviewed.
    #[must_use]
    pub fn current_question(&self) -> Option<&DrawnQuestion> {
        let quiz = self.active.as_ref()?;
        match quiz.state {
            QuizState::InProgress | QuizState::AnswerShown => quiz.drawn.get(quiz.current),
            QuizState::NotStarted | QuizState::Finished => None,
        }
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&AnswerResult> {
        self.results().last()
    }

    /// Returns a summary of the current quiz progress.
    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.drawn().len();
        let answered = self.results().len();
        QuizProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            state: self.state(),
        }
    }

    fn active_in(
        &mut self,
        operation: &'static str,
        expected: QuizState,
    ) -> Result<&mut ActiveQuiz, QuizError> {
        let state = self.state();
        match self.active.as_mut() {
            Some(quiz) if quiz.state == expected => Ok(quiz),
            _ => Err(QuizError::InvalidState { operation, state }),
        }
    }

    /// Tentatively choose an option for the current question.
    ///
    /// Choosing again replaces the earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `InProgress` and
    /// `QuizError::UnknownOption` if `choice` is not one of the question's options.
    pub fn select_option(&mut self, choice: &str) -> Result<(), QuizError> {
        let quiz = self.active_in("select an option", QuizState::InProgress)?;
        let drawn = &quiz.drawn[quiz.current];
        if !drawn.options().iter().any(|o| o == choice) {
            return Err(QuizError::UnknownOption {
                option: choice.to_owned(),
            });
        }
        quiz.selection = Some(choice.to_owned());
        Ok(())
    }

    /// Check the selected option and record the result. The answer is final.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `InProgress` and
    /// `QuizError::NoSelectionMade` if no option was selected.
    pub fn submit_answer(&mut self) -> Result<&AnswerResult, QuizError> {
        let quiz = self.active_in("submit an answer", QuizState::InProgress)?;
        let chosen = quiz.selection.take().ok_or(QuizError::NoSelectionMade)?;
        let drawn = &quiz.drawn[quiz.current];
        let question = drawn.question();
        let is_correct = question.is_correct(&chosen);

        let result = AnswerResult {
            question_id: question.id(),
            question: question.text().to_owned(),
            subject: question.subject().to_owned(),
            topic: question.topic().to_owned(),
            options: drawn.options().to_vec(),
            chosen_option: chosen,
            correct_option: question.correct_option().to_owned(),
            is_correct,
        };
        quiz.state = QuizState::AnswerShown;
        tracing::debug!(
            index = quiz.current,
            question = %question.id(),
            is_correct,
            "answer submitted"
        );

        quiz.results.push(result);
        Ok(&quiz.results[quiz.results.len() - 1])
    }

    /// Move past the shown answer to the next question, or finish.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `AnswerShown`.
    pub fn advance(&mut self) -> Result<QuizState, QuizError> {
        let quiz = self.active_in("advance", QuizState::AnswerShown)?;
        quiz.current += 1;
        quiz.state = if quiz.current < quiz.drawn.len() {
            QuizState::InProgress
        } else {
            QuizState::Finished
        };
        tracing::debug!(index = quiz.current, state = %quiz.state, "quiz advanced");
        Ok(quiz.state)
    }

    /// Tally the finished attempt.
    ///
    /// The first call fixes the summary; later calls return the same value.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` before `Finished`. A `completed_at`
    /// before the start time counts as zero seconds.
    pub fn finish(&mut self, completed_at: DateTime<Utc>) -> Result<QuizSummary, QuizError> {
        let quiz = self.active_in("finish", QuizState::Finished)?;
        if let Some(summary) = &quiz.summary {
            return Ok(summary.clone());
        }
        let summary = QuizSummary::from_results(
            quiz.subject.clone(),
            quiz.drawn.len(),
            &quiz.results,
            quiz.started_at,
            completed_at,
        )?;
        tracing::info!(
            subject = %summary.subject(),
            score = summary.score(),
            total = summary.total(),
            elapsed_seconds = summary.elapsed_seconds(),
            "quiz finished"
        );
        quiz.summary = Some(summary.clone());
        Ok(summary)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("state", &self.state())
            .field("subject", &self.subject())
            .field("drawn_len", &self.drawn().len())
            .field("current", &self.current_index())
            .field("results_len", &self.results().len())
            .field("started_at", &self.started_at())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use classroom_core::model::{QuizAttempt, QuizAttemptRecord, QuizSummary, StudentId};
use storage::{QuestionBank, QuizAttemptRepository};

use super::session::QuizSession;
use crate::Clock;
use crate::error::{AttemptError, QuizError};

/// Orchestrates quiz start, finish and attempt persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    attempts: Arc<dyn QuizAttemptRepository>,
    seed: Option<u64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            clock,
            bank,
            attempts,
            seed: None,
        }
    }

    /// Draw from a seeded generator so runs repeat exactly.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        self.bank.subjects()
    }

    /// Start a new quiz for `subject` with up to `count` questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestionsAvailable` if the bank has nothing for the subject.
    pub fn start_quiz(&self, subject: &str, count: usize) -> Result<QuizSession, QuizError> {
        let mut session = QuizSession::new();
        let now = self.clock.now();
        match self.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                session.start(self.bank.questions(), subject, count, now, &mut rng)?;
            }
            None => {
                let mut rng = rand::rng();
                session.start(self.bank.questions(), subject, count, now, &mut rng)?;
            }
        }
        Ok(session)
    }

    /// Finish the session at the current clock time.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` if questions remain unanswered.
    pub fn finish_quiz(&self, session: &mut QuizSession) -> Result<QuizSummary, QuizError> {
        session.finish(self.clock.now())
    }

    /// Record a finished attempt for `student_id`. Not retried.
    ///
    /// The summary is left as is whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Storage` if the repository rejects or cannot take the attempt.
    pub async fn submit_attempt(
        &self,
        student_id: &StudentId,
        summary: &QuizSummary,
    ) -> Result<QuizAttempt, AttemptError> {
        let attempt = QuizAttempt::from_summary(student_id.clone(), summary);
        match self.attempts.submit_quiz_attempt(&attempt).await {
            Ok(()) => {
                tracing::info!(
                    student = %student_id,
                    subject = %attempt.subject,
                    score = attempt.score,
                    "quiz attempt saved"
                );
                Ok(attempt)
            }
            Err(err) => {
                tracing::warn!(student = %student_id, error = %err, "quiz attempt not saved");
                Err(err.into())
            }
        }
    }

    /// Past attempts for a student, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Storage` if the history cannot be read.
    pub async fn history(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<QuizAttemptRecord>, AttemptError> {
        let history = self.attempts.quiz_history(student_id).await.map_err(|err| {
            tracing::warn!(student = %student_id, error = %err, "quiz history unavailable");
            err
        })?;
        Ok(history)
    }
}

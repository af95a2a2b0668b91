use super::session::QuizState;

/// Aggregated view of quiz progress, useful for a question counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub state: QuizState,
}

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question subject cannot be empty")]
    EmptySubject,

    #[error("question topic cannot be empty")]
    EmptyTopic,

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option {option:?} appears more than once")]
    DuplicateOption { option: String },

    #[error("correct answer {answer:?} is not one of the options")]
    AnswerNotAnOption { answer: String },
}

//
// ─── WIRE RECORD ───────────────────────────────────────────────────────────────
//

/// Shape of one entry in the static quiz content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub subject: String,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// Options keep their authored order; `correct_option` is always one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    subject: String,
    topic: String,
    text: String,
    options: Vec<String>,
    correct_option: String,
}

impl Question {
    /// Builds a question, trimming the labels and validating the options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when a label is blank, fewer than two options are given,
    /// options repeat, or the correct answer is not among the options.
    pub fn new(
        id: QuestionId,
        subject: impl Into<String>,
        topic: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_option: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let subject = non_blank(subject.into()).ok_or(QuestionError::EmptySubject)?;
        let topic = non_blank(topic.into()).ok_or(QuestionError::EmptyTopic)?;
        let text = non_blank(text.into()).ok_or(QuestionError::EmptyText)?;

        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption {
                    option: option.clone(),
                });
            }
        }

        let correct_option = correct_option.into();
        if !options.contains(&correct_option) {
            return Err(QuestionError::AnswerNotAnOption {
                answer: correct_option,
            });
        }

        Ok(Self {
            id,
            subject,
            topic,
            text,
            options,
            correct_option,
        })
    }

    /// Validates a content-file record under the given id.
    ///
    /// # Errors
    ///
    /// Same as [`Question::new`].
    pub fn from_record(id: QuestionId, record: QuestionRecord) -> Result<Self, QuestionError> {
        Self::new(
            id,
            record.subject,
            record.topic,
            record.question,
            record.options,
            record.answer,
        )
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct_option == choice
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn valid_question_keeps_authored_option_order() {
        let q = Question::new(
            QuestionId::new(1),
            " Math ",
            "Fractions",
            "What is 1/2 + 1/4?",
            options(&["3/4", "2/6", "1/8"]),
            "3/4",
        )
        .unwrap();
        assert_eq!(q.subject(), "Math");
        assert_eq!(q.options(), ["3/4", "2/6", "1/8"]);
        assert!(q.is_correct("3/4"));
        assert!(!q.is_correct("1/8"));
    }

    #[test]
    fn single_option_is_rejected() {
        let err = Question::new(QuestionId::new(1), "Math", "T", "Q", options(&["a"]), "a")
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { count: 1 });
    }

    #[test]
    fn duplicate_options_are_rejected() {
        let err = Question::new(
            QuestionId::new(1),
            "Math",
            "T",
            "Q",
            options(&["a", "b", "a"]),
            "a",
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateOption { .. }));
    }

    #[test]
    fn answer_must_be_an_option() {
        let err = Question::new(QuestionId::new(1), "Math", "T", "Q", options(&["a", "b"]), "c")
            .unwrap_err();
        assert!(matches!(err, QuestionError::AnswerNotAnOption { .. }));
    }

    #[test]
    fn record_deserializes_from_content_file_shape() {
        let json = r#"{"subject":"Science","topic":"Cells","question":"Powerhouse of the cell?",
            "options":["Nucleus","Mitochondria"],"answer":"Mitochondria"}"#;
        let record: QuestionRecord = serde_json::from_str(json).unwrap();
        let q = Question::from_record(QuestionId::new(9), record).unwrap();
        assert_eq!(q.topic(), "Cells");
        assert_eq!(q.correct_option(), "Mitochondria");
    }
}

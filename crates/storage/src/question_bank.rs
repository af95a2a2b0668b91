use std::path::Path;

use thiserror::Error;

use classroom_core::model::{Question, QuestionError, QuestionId, QuestionRecord};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question #{index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Immutable table of quiz questions, loaded once at startup.
///
/// Question ids are the 1-based position in the source file.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Validate content records in file order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::InvalidQuestion` for the first record that fails validation.
    pub fn from_records(records: Vec<QuestionRecord>) -> Result<Self, QuestionBankError> {
        let questions = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                let index = idx + 1;
                Question::from_record(QuestionId::new(index as u64), record)
                    .map_err(|source| QuestionBankError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { questions })
    }

    /// Parse a JSON array of question records.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Parse` or `InvalidQuestion`.
    pub fn from_json_str(json: &str) -> Result<Self, QuestionBankError> {
        let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    /// Read and parse a question bank file.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let bank = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            questions = bank.len(),
            subjects = bank.subjects().len(),
            "loaded question bank"
        );
        Ok(bank)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Distinct subjects in first-seen order.
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = Vec::new();
        for q in &self.questions {
            if !subjects.contains(&q.subject()) {
                subjects.push(q.subject());
            }
        }
        subjects
    }
}

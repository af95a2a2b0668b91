use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::StudentId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum StudentRecordError {
    #[error("student name cannot be empty")]
    EmptyName,

    #[error("attendance rate must be within 0-100, got {value}")]
    InvalidAttendance { value: f64 },

    #[error("score for {subject} must be within 0-100, got {value}")]
    InvalidScore { subject: String, value: f64 },

    #[error("subject name cannot be empty")]
    EmptySubject,
}

fn check_percent(subject: &str, value: f64) -> Result<(), StudentRecordError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(StudentRecordError::InvalidScore {
            subject: subject.to_owned(),
            value,
        })
    }
}

//
// ─── SUBJECT MARKS ─────────────────────────────────────────────────────────────
//

/// A subject paired with a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub subject: String,
    pub score: f64,
}

impl SubjectScore {
    #[must_use]
    pub fn new(subject: impl Into<String>, score: f64) -> Self {
        Self {
            subject: subject.into(),
            score,
        }
    }
}

fn subject_key(subject: String) -> Result<String, StudentRecordError> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        return Err(StudentRecordError::EmptySubject);
    }
    Ok(trimmed.to_owned())
}

/// Current score per subject.
///
/// Entries keep insertion order. That order is part of the contract: aggregate
/// tie-breaks pick the earliest entry. Re-inserting a subject updates it in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, f64>", into = "IndexMap<String, f64>")]
pub struct SubjectMarks {
    entries: IndexMap<String, f64>,
}

impl SubjectMarks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a subject score.
    ///
    /// # Errors
    ///
    /// Returns `StudentRecordError` for a blank subject or a score outside 0-100.
    pub fn insert(
        &mut self,
        subject: impl Into<String>,
        score: f64,
    ) -> Result<(), StudentRecordError> {
        let subject = subject_key(subject.into())?;
        check_percent(&subject, score)?;
        self.entries.insert(subject, score);
        Ok(())
    }

    /// Builds marks from `(subject, score)` pairs in the given order.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, StudentRecordError> {
        let mut marks = Self::new();
        for (subject, score) in pairs {
            marks.insert(subject, score)?;
        }
        Ok(marks)
    }

    #[must_use]
    pub fn get(&self, subject: &str) -> Option<f64> {
        self.entries.get(subject).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(subject, score)| (subject.as_str(), *score))
    }

    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.values().copied()
    }
}

impl TryFrom<IndexMap<String, f64>> for SubjectMarks {
    type Error = StudentRecordError;

    fn try_from(raw: IndexMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_pairs(raw)
    }
}

impl From<SubjectMarks> for IndexMap<String, f64> {
    fn from(marks: SubjectMarks) -> Self {
        marks.entries
    }
}

//
// ─── HISTORICAL MARKS ──────────────────────────────────────────────────────────
//

/// Past scores per subject, oldest first, subjects in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, Vec<f64>>",
    into = "IndexMap<String, Vec<f64>>"
)]
pub struct HistoricalMarks {
    entries: IndexMap<String, Vec<f64>>,
}

impl HistoricalMarks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the history for a subject.
    ///
    /// # Errors
    ///
    /// Returns `StudentRecordError` for a blank subject or any score outside 0-100.
    pub fn insert(
        &mut self,
        subject: impl Into<String>,
        scores: Vec<f64>,
    ) -> Result<(), StudentRecordError> {
        let subject = subject_key(subject.into())?;
        for score in &scores {
            check_percent(&subject, *score)?;
        }
        self.entries.insert(subject, scores);
        Ok(())
    }

    /// Builds histories from `(subject, scores)` pairs in the given order.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (S, Vec<f64>)>,
    ) -> Result<Self, StudentRecordError> {
        let mut history = Self::new();
        for (subject, scores) in pairs {
            history.insert(subject, scores)?;
        }
        Ok(history)
    }

    #[must_use]
    pub fn get(&self, subject: &str) -> Option<&[f64]> {
        self.entries.get(subject).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries
            .iter()
            .map(|(subject, scores)| (subject.as_str(), scores.as_slice()))
    }
}

impl TryFrom<IndexMap<String, Vec<f64>>> for HistoricalMarks {
    type Error = StudentRecordError;

    fn try_from(raw: IndexMap<String, Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_pairs(raw)
    }
}

impl From<HistoricalMarks> for IndexMap<String, Vec<f64>> {
    fn from(history: HistoricalMarks) -> Self {
        history.entries
    }
}

//
// ─── STUDENT RECORD ────────────────────────────────────────────────────────────
//

/// Read-only performance record for one student, as supplied by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    id: StudentId,
    name: String,
    class: String,
    attendance_rate: f64,
    marks: SubjectMarks,
    historical_marks: HistoricalMarks,
}

impl StudentRecord {
    /// Builds a validated record.
    ///
    /// # Errors
    ///
    /// Returns `StudentRecordError::EmptyName` or `InvalidAttendance`.
    pub fn new(
        id: StudentId,
        name: impl Into<String>,
        class: impl Into<String>,
        attendance_rate: f64,
        marks: SubjectMarks,
        historical_marks: HistoricalMarks,
    ) -> Result<Self, StudentRecordError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(StudentRecordError::EmptyName);
        }
        if !attendance_rate.is_finite() || !(0.0..=100.0).contains(&attendance_rate) {
            return Err(StudentRecordError::InvalidAttendance {
                value: attendance_rate,
            });
        }
        Ok(Self {
            id,
            name,
            class: class.into().trim().to_owned(),
            attendance_rate,
            marks,
            historical_marks,
        })
    }

    #[must_use]
    pub fn id(&self) -> &StudentId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn attendance_rate(&self) -> f64 {
        self.attendance_rate
    }

    #[must_use]
    pub fn marks(&self) -> &SubjectMarks {
        &self.marks
    }

    #[must_use]
    pub fn historical_marks(&self) -> &HistoricalMarks {
        &self.historical_marks
    }
}

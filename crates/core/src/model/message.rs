use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ComplaintId, DoubtId, ParentId, StudentId, TeacherId};
use crate::model::student::StudentRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("answer text cannot be empty")]
    EmptyAnswer,

    #[error("complaint remark cannot be empty")]
    EmptyRemark,
}

fn required(text: &str, err: MessageError) -> Result<String, MessageError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed.to_owned())
    }
}

//
// ─── ACCOUNTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
}

/// A parent account and the students linked to it, in link order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    pub id: ParentId,
    pub name: String,
    pub children: Vec<StudentId>,
}

impl Parent {
    #[must_use]
    pub fn is_parent_of(&self, student: &StudentId) -> bool {
        self.children.contains(student)
    }
}

//
// ─── DOUBTS ────────────────────────────────────────────────────────────────────
//

/// A question a student sends to a teacher.
///
/// Without a teacher the doubt is visible to every teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoubt {
    student_id: StudentId,
    teacher_id: Option<TeacherId>,
    question: String,
}

impl NewDoubt {
    /// # Errors
    ///
    /// Returns `MessageError::EmptyQuestion` for blank text.
    pub fn new(
        student_id: StudentId,
        teacher_id: Option<TeacherId>,
        question: &str,
    ) -> Result<Self, MessageError> {
        Ok(Self {
            student_id,
            teacher_id,
            question: required(question, MessageError::EmptyQuestion)?,
        })
    }

    #[must_use]
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    #[must_use]
    pub fn teacher_id(&self) -> Option<&TeacherId> {
        self.teacher_id.as_ref()
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }
}

/// Validated answer text for a doubt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubtAnswer(String);

impl DoubtAnswer {
    /// # Errors
    ///
    /// Returns `MessageError::EmptyAnswer` for blank text.
    pub fn new(text: &str) -> Result<Self, MessageError> {
        required(text, MessageError::EmptyAnswer).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored doubt as listed to students and teachers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doubt {
    pub id: DoubtId,
    pub student_id: StudentId,
    pub student_name: String,
    pub teacher_id: Option<TeacherId>,
    pub question: String,
    pub answer: Option<String>,
    pub resolved: bool,
}

impl Doubt {
    /// Unresolved and either addressed to `teacher` or to nobody.
    #[must_use]
    pub fn is_pending_for(&self, teacher: &TeacherId) -> bool {
        !self.resolved && self.teacher_id.as_ref().is_none_or(|t| t == teacher)
    }

    /// Record an answer. Answering also resolves.
    pub fn answer_with(&mut self, answer: DoubtAnswer) {
        self.answer = Some(answer.0);
        self.resolved = true;
    }
}

//
// ─── COMPLAINTS ────────────────────────────────────────────────────────────────
//

/// A teacher's remark about a student, delivered to the student's first parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComplaint {
    teacher_id: TeacherId,
    student_id: StudentId,
    remark: String,
}

impl NewComplaint {
    /// # Errors
    ///
    /// Returns `MessageError::EmptyRemark` for a blank remark.
    pub fn new(
        teacher_id: TeacherId,
        student_id: StudentId,
        remark: &str,
    ) -> Result<Self, MessageError> {
        Ok(Self {
            teacher_id,
            student_id,
            remark: required(remark, MessageError::EmptyRemark)?,
        })
    }

    #[must_use]
    pub fn teacher_id(&self) -> &TeacherId {
        &self.teacher_id
    }

    #[must_use]
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    #[must_use]
    pub fn remark(&self) -> &str {
        &self.remark
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Complaint {
    pub id: ComplaintId,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub student_id: StudentId,
    pub student_name: String,
    pub parent_id: ParentId,
    pub remark: String,
    /// The student's record when the complaint was sent, if the backend kept one.
    pub report: Option<StudentRecord>,
    pub created_at: DateTime<Utc>,
}

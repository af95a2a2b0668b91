//! JSON shapes used by the school backend and by local student files.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use classroom_core::model::{
    AttemptId, Complaint, ComplaintId, Doubt, DoubtId, HistoricalMarks, NewComplaint, NewDoubt,
    Parent, ParentId, QuizAttemptRecord, StudentId, StudentRecord, SubjectMarks, Teacher,
    TeacherId,
};

use crate::repository::StorageError;

#[derive(Debug, Deserialize)]
pub(crate) struct StudentPayload {
    id: String,
    name: String,
    #[serde(default, alias = "class")]
    class_name: Option<String>,
    #[serde(default)]
    attendance: Option<f64>,
    #[serde(default)]
    marks: Option<SubjectMarks>,
    #[serde(default, rename = "historicalMarks", alias = "historical_marks")]
    historical_marks: Option<HistoricalMarks>,
}

impl StudentPayload {
    pub(crate) fn id(&self) -> &str {
        self.id.trim()
    }

    pub(crate) fn into_record(self) -> Result<StudentRecord, StorageError> {
        let id = StudentId::new(self.id).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let attendance = self.attendance.ok_or_else(|| {
            StorageError::Serialization(format!("student {id} has no attendance rate"))
        })?;
        StudentRecord::new(
            id,
            self.name,
            self.class_name.unwrap_or_default(),
            attendance,
            self.marks.unwrap_or_default(),
            self.historical_marks.unwrap_or_default(),
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

fn id_field<T, E: std::fmt::Display>(parsed: Result<T, E>) -> Result<T, StorageError> {
    parsed.map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Converts a list of payloads, skipping records that fail validation.
pub(crate) fn valid_records(payloads: Vec<StudentPayload>) -> Vec<StudentRecord> {
    payloads
        .into_iter()
        .filter_map(|payload| match payload.into_record() {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(error = %err, "skipping invalid student record");
                None
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptRow {
    id: i64,
    student_id: String,
    subject: String,
    score: u32,
    total_questions: u32,
    accuracy: f64,
    time_taken_seconds: u64,
    attempted_at: String,
}

impl AttemptRow {
    pub(crate) fn into_record(self) -> Result<QuizAttemptRecord, StorageError> {
        Ok(QuizAttemptRecord {
            id: AttemptId::new(self.id),
            student_id: StudentId::new(self.student_id)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            subject: self.subject,
            score: self.score,
            total_questions: self.total_questions,
            accuracy: self.accuracy,
            time_taken_seconds: self.time_taken_seconds,
            attempted_at: parse_timestamp(&self.attempted_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DoubtRow {
    id: i64,
    student_id: String,
    #[serde(default)]
    student_name: String,
    #[serde(default)]
    teacher_id: Option<String>,
    question_text: String,
    #[serde(default)]
    answer_text: Option<String>,
    #[serde(default)]
    is_resolved: bool,
}

impl DoubtRow {
    pub(crate) fn into_doubt(self) -> Result<Doubt, StorageError> {
        Ok(Doubt {
            id: DoubtId::new(self.id),
            student_id: id_field(StudentId::new(self.student_id))?,
            student_name: self.student_name,
            teacher_id: self
                .teacher_id
                .filter(|t| !t.trim().is_empty())
                .map(|t| id_field(TeacherId::new(t)))
                .transpose()?,
            question: self.question_text,
            answer: self.answer_text.filter(|a| !a.trim().is_empty()),
            resolved: self.is_resolved,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DoubtsResponse {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) doubts: Vec<DoubtRow>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComplaintRow {
    id: i64,
    teacher_id: String,
    #[serde(default)]
    teacher_name: String,
    student_id: String,
    #[serde(default)]
    student_name: String,
    parent_id: String,
    teacher_remark: String,
    #[serde(default)]
    report_content: Option<serde_json::Value>,
    created_at: String,
}

impl ComplaintRow {
    pub(crate) fn into_complaint(self) -> Result<Complaint, StorageError> {
        // A report snapshot that no longer validates is dropped, not fatal.
        let report = self
            .report_content
            .and_then(|raw| serde_json::from_value::<StudentPayload>(raw).ok())
            .and_then(|payload| payload.into_record().ok());
        Ok(Complaint {
            id: ComplaintId::new(self.id),
            teacher_id: id_field(TeacherId::new(self.teacher_id))?,
            teacher_name: self.teacher_name,
            student_id: id_field(StudentId::new(self.student_id))?,
            student_name: self.student_name,
            parent_id: id_field(ParentId::new(self.parent_id))?,
            remark: self.teacher_remark,
            report,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComplaintsResponse {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) complaints: Vec<ComplaintRow>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChildrenResponse {
    #[serde(default)]
    pub(crate) children: Vec<StudentPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AskDoubtRequest<'a> {
    student_id: &'a str,
    question_text: &'a str,
    teacher_id: Option<&'a str>,
}

impl<'a> From<&'a NewDoubt> for AskDoubtRequest<'a> {
    fn from(doubt: &'a NewDoubt) -> Self {
        Self {
            student_id: doubt.student_id().as_str(),
            question_text: doubt.question(),
            teacher_id: doubt.teacher_id().map(TeacherId::as_str),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerDoubtRequest<'a> {
    pub(crate) answer_text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ComplaintRequest<'a> {
    teacher_id: &'a str,
    student_id: &'a str,
    remark: &'a str,
}

impl<'a> From<&'a NewComplaint> for ComplaintRequest<'a> {
    fn from(complaint: &'a NewComplaint) -> Self {
        Self {
            teacher_id: complaint.teacher_id().as_str(),
            student_id: complaint.student_id().as_str(),
            remark: complaint.remark(),
        }
    }
}

/// A local data file: either a bare student list or students with their school accounts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SchoolDocument {
    Students(Vec<StudentPayload>),
    School {
        students: Vec<StudentPayload>,
        #[serde(default)]
        teachers: Vec<AccountPayload>,
        #[serde(default)]
        parents: Vec<AccountPayload>,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountPayload {
    id: String,
    name: String,
    #[serde(default, alias = "children_ids")]
    children: Vec<String>,
}

impl AccountPayload {
    pub(crate) fn into_teacher(self) -> Result<Teacher, StorageError> {
        Ok(Teacher {
            id: id_field(TeacherId::new(self.id))?,
            name: self.name,
        })
    }

    pub(crate) fn into_parent(self) -> Result<Parent, StorageError> {
        Ok(Parent {
            id: id_field(ParentId::new(self.id))?,
            name: self.name,
            children: self
                .children
                .into_iter()
                .map(|c| id_field(StudentId::new(c)))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// The backend emits naive UTC timestamps; offsets are accepted too.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| StorageError::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) history: Vec<AttemptRow>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(default)]
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

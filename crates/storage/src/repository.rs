use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use classroom_core::Clock;
use classroom_core::model::{
    AttemptId, Complaint, ComplaintId, Doubt, DoubtAnswer, DoubtId, NewComplaint, NewDoubt,
    Parent, ParentId, QuizAttempt, QuizAttemptRecord, StudentId, StudentRecord, Teacher,
    TeacherId,
};

use crate::http::HttpBackend;
use crate::wire::{SchoolDocument, valid_records};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read access to student performance records owned by the backend.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Fetch a single student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn fetch_student(&self, id: &StudentId) -> Result<StudentRecord, StorageError>;

    /// Fetch every student visible to the dashboard, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be retrieved.
    async fn list_students(&self) -> Result<Vec<StudentRecord>, StorageError>;

    /// Students linked to a parent, in link order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown parent.
    async fn children_of(&self, parent: &ParentId) -> Result<Vec<StudentRecord>, StorageError>;
}

/// Student questions for teachers, and the teachers' answers.
#[async_trait]
pub trait DoubtRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown student.
    async fn ask_doubt(&self, doubt: &NewDoubt) -> Result<(), StorageError>;

    /// Unresolved doubts addressed to `teacher` or to no one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown teacher.
    async fn pending_doubts(&self, teacher: &TeacherId) -> Result<Vec<Doubt>, StorageError>;

    /// Every doubt a student has asked, answered or not.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown student.
    async fn student_doubts(&self, student: &StudentId) -> Result<Vec<Doubt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown doubt.
    async fn resolve_doubt(&self, id: DoubtId) -> Result<(), StorageError>;

    /// Store the answer and resolve the doubt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown doubt.
    async fn answer_doubt(&self, id: DoubtId, answer: &DoubtAnswer) -> Result<(), StorageError>;
}

/// Teacher remarks delivered to parents.
#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// Deliver to the student's first linked parent with a snapshot of the record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student is unknown or has no parent.
    async fn send_complaint(&self, complaint: &NewComplaint) -> Result<(), StorageError>;

    /// Complaints received by a parent, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown parent.
    async fn parent_complaints(&self, parent: &ParentId) -> Result<Vec<Complaint>, StorageError>;
}

/// Write-once sink for finished quiz attempts, plus their history.
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Record a finished attempt. Not retried by callers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown student, or other storage errors.
    async fn submit_quiz_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError>;

    /// Past attempts for a student, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown student, or other storage errors.
    async fn quiz_history(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and offline demos.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    students: Arc<Mutex<Vec<StudentRecord>>>,
    attempts: Arc<Mutex<Vec<QuizAttemptRecord>>>,
    teachers: Arc<Mutex<Vec<Teacher>>>,
    parents: Arc<Mutex<Vec<Parent>>>,
    doubts: Arc<Mutex<Vec<Doubt>>>,
    complaints: Arc<Mutex<Vec<Complaint>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn next_id(len: usize) -> Result<i64, StorageError> {
    i64::try_from(len + 1).map_err(|e| StorageError::Serialization(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp submitted attempts with this clock instead of the system time.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build a repository from a JSON document.
    ///
    /// The document is either an array of student records or an object with
    /// `students`, `teachers` and `parents`. Students that fail validation are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the document has neither shape
    /// or an account id is blank.
    pub fn from_students_json(json: &str) -> Result<Self, StorageError> {
        let document: SchoolDocument =
            serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let repo = Self::new();
        match document {
            SchoolDocument::Students(students) => {
                locked(&repo.students)?.extend(valid_records(students));
            }
            SchoolDocument::School {
                students,
                teachers,
                parents,
            } => {
                locked(&repo.students)?.extend(valid_records(students));
                for teacher in teachers {
                    repo.upsert_teacher(teacher.into_teacher()?)?;
                }
                for parent in parents {
                    repo.upsert_parent(parent.into_parent()?)?;
                }
            }
        }
        Ok(repo)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_teacher(&self, teacher: Teacher) -> Result<(), StorageError> {
        let mut guard = locked(&self.teachers)?;
        match guard.iter_mut().find(|t| t.id == teacher.id) {
            Some(existing) => *existing = teacher,
            None => guard.push(teacher),
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_parent(&self, parent: Parent) -> Result<(), StorageError> {
        let mut guard = locked(&self.parents)?;
        match guard.iter_mut().find(|p| p.id == parent.id) {
            Some(existing) => *existing = parent,
            None => guard.push(parent),
        }
        Ok(())
    }

    /// Insert or replace a student, keeping the original position on replace.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_student(&self, student: StudentRecord) -> Result<(), StorageError> {
        let mut guard = locked(&self.students)?;
        match guard.iter_mut().find(|s| s.id() == student.id()) {
            Some(existing) => *existing = student,
            None => guard.push(student),
        }
        Ok(())
    }

    fn has_student(&self, id: &StudentId) -> Result<bool, StorageError> {
        Ok(locked(&self.students)?.iter().any(|s| s.id() == id))
    }

    fn find_student(&self, id: &StudentId) -> Result<StudentRecord, StorageError> {
        locked(&self.students)?
            .iter()
            .find(|s| s.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn find_parent(&self, id: &ParentId) -> Result<Parent, StorageError> {
        locked(&self.parents)?
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn update_doubt(
        &self,
        id: DoubtId,
        apply: impl FnOnce(&mut Doubt),
    ) -> Result<(), StorageError> {
        let mut guard = locked(&self.doubts)?;
        let doubt = guard
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StorageError::NotFound)?;
        apply(doubt);
        Ok(())
    }
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn fetch_student(&self, id: &StudentId) -> Result<StudentRecord, StorageError> {
        self.find_student(id)
    }

    async fn list_students(&self) -> Result<Vec<StudentRecord>, StorageError> {
        Ok(locked(&self.students)?.clone())
    }

    async fn children_of(&self, parent: &ParentId) -> Result<Vec<StudentRecord>, StorageError> {
        let parent = self.find_parent(parent)?;
        let guard = locked(&self.students)?;
        Ok(parent
            .children
            .iter()
            .filter_map(|child| guard.iter().find(|s| s.id() == child).cloned())
            .collect())
    }
}

#[async_trait]
impl DoubtRepository for InMemoryRepository {
    async fn ask_doubt(&self, doubt: &NewDoubt) -> Result<(), StorageError> {
        let student = self.find_student(doubt.student_id())?;
        let mut guard = locked(&self.doubts)?;
        let id = DoubtId::new(next_id(guard.len())?);
        guard.push(Doubt {
            id,
            student_id: student.id().clone(),
            student_name: student.name().to_owned(),
            teacher_id: doubt.teacher_id().cloned(),
            question: doubt.question().to_owned(),
            answer: None,
            resolved: false,
        });
        Ok(())
    }

    async fn pending_doubts(&self, teacher: &TeacherId) -> Result<Vec<Doubt>, StorageError> {
        if !locked(&self.teachers)?.iter().any(|t| &t.id == teacher) {
            return Err(StorageError::NotFound);
        }
        Ok(locked(&self.doubts)?
            .iter()
            .filter(|d| d.is_pending_for(teacher))
            .cloned()
            .collect())
    }

    async fn student_doubts(&self, student: &StudentId) -> Result<Vec<Doubt>, StorageError> {
        if !self.has_student(student)? {
            return Err(StorageError::NotFound);
        }
        Ok(locked(&self.doubts)?
            .iter()
            .filter(|d| &d.student_id == student)
            .cloned()
            .collect())
    }

    async fn resolve_doubt(&self, id: DoubtId) -> Result<(), StorageError> {
        self.update_doubt(id, |doubt| doubt.resolved = true)
    }

    async fn answer_doubt(&self, id: DoubtId, answer: &DoubtAnswer) -> Result<(), StorageError> {
        self.update_doubt(id, |doubt| doubt.answer_with(answer.clone()))
    }
}

#[async_trait]
impl ComplaintRepository for InMemoryRepository {
    async fn send_complaint(&self, complaint: &NewComplaint) -> Result<(), StorageError> {
        let student = self.find_student(complaint.student_id())?;
        let parent_id = locked(&self.parents)?
            .iter()
            .find(|p| p.is_parent_of(student.id()))
            .map(|p| p.id.clone())
            .ok_or(StorageError::NotFound)?;
        let teacher_name = locked(&self.teachers)?
            .iter()
            .find(|t| &t.id == complaint.teacher_id())
            .map(|t| t.name.clone())
            .ok_or(StorageError::NotFound)?;

        let mut guard = locked(&self.complaints)?;
        let id = ComplaintId::new(next_id(guard.len())?);
        guard.push(Complaint {
            id,
            teacher_id: complaint.teacher_id().clone(),
            teacher_name,
            student_id: student.id().clone(),
            student_name: student.name().to_owned(),
            parent_id,
            remark: complaint.remark().to_owned(),
            report: Some(student),
            created_at: self.clock.now(),
        });
        Ok(())
    }

    async fn parent_complaints(&self, parent: &ParentId) -> Result<Vec<Complaint>, StorageError> {
        self.find_parent(parent)?;
        let mut received: Vec<Complaint> = locked(&self.complaints)?
            .iter()
            .filter(|c| &c.parent_id == parent)
            .cloned()
            .collect();
        received.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(received)
    }
}

#[async_trait]
impl QuizAttemptRepository for InMemoryRepository {
    async fn submit_quiz_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError> {
        if !self.has_student(&attempt.student_id)? {
            return Err(StorageError::NotFound);
        }
        let mut guard = locked(&self.attempts)?;
        let id = AttemptId::new(next_id(guard.len())?);
        guard.push(QuizAttemptRecord {
            id,
            student_id: attempt.student_id.clone(),
            subject: attempt.subject.clone(),
            score: attempt.score,
            total_questions: attempt.total_questions,
            accuracy: attempt.accuracy,
            time_taken_seconds: attempt.time_taken_seconds,
            attempted_at: self.clock.now(),
        });
        Ok(())
    }

    async fn quiz_history(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError> {
        if !self.has_student(student_id)? {
            return Err(StorageError::NotFound);
        }
        let mut history: Vec<_> = locked(&self.attempts)?
            .iter()
            .filter(|a| &a.student_id == student_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            b.attempted_at
                .cmp(&a.attempted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(history)
    }
}

/// Bundles the collaborator contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub students: Arc<dyn StudentRepository>,
    pub attempts: Arc<dyn QuizAttemptRepository>,
    pub doubts: Arc<dyn DoubtRepository>,
    pub complaints: Arc<dyn ComplaintRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let repo = Arc::new(repo);
        Self {
            students: repo.clone(),
            attempts: repo.clone(),
            doubts: repo.clone(),
            complaints: repo,
        }
    }

    /// Storage backed by the school backend's HTTP API.
    #[must_use]
    pub fn http(base_url: &str) -> Self {
        let backend = Arc::new(HttpBackend::new(base_url));
        Self {
            students: backend.clone(),
            attempts: backend.clone(),
            doubts: backend.clone(),
            complaints: backend,
        }
    }
}

//! Doubts from students to teachers and complaints from teachers to parents.

use std::sync::Arc;

use classroom_core::model::{
    Complaint, Doubt, DoubtAnswer, DoubtId, NewComplaint, NewDoubt, ParentId, StudentId,
    TeacherId,
};
use storage::{ComplaintRepository, DoubtRepository, StorageError};

use crate::error::InboxError;

fn logged(action: &'static str) -> impl FnOnce(StorageError) -> StorageError {
    move |err| {
        tracing::warn!(error = %err, "{action} failed");
        err
    }
}

#[derive(Clone)]
pub struct InboxService {
    doubts: Arc<dyn DoubtRepository>,
    complaints: Arc<dyn ComplaintRepository>,
}

impl InboxService {
    #[must_use]
    pub fn new(doubts: Arc<dyn DoubtRepository>, complaints: Arc<dyn ComplaintRepository>) -> Self {
        Self { doubts, complaints }
    }

    /// Send a question to `teacher`, or to every teacher when `None`.
    ///
    /// # Errors
    ///
    /// Returns `InboxError::Invalid` for blank text before anything is sent,
    /// or `InboxError::Storage` if the backend refuses it.
    pub async fn ask_doubt(
        &self,
        student: &StudentId,
        teacher: Option<TeacherId>,
        question: &str,
    ) -> Result<(), InboxError> {
        let doubt = NewDoubt::new(student.clone(), teacher, question)?;
        self.doubts
            .ask_doubt(&doubt)
            .await
            .map_err(logged("asking a doubt"))?;
        tracing::info!(student = %student, "doubt sent");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InboxError::Storage` if the queue cannot be read.
    pub async fn pending_doubts(&self, teacher: &TeacherId) -> Result<Vec<Doubt>, InboxError> {
        Ok(self
            .doubts
            .pending_doubts(teacher)
            .await
            .map_err(logged("listing pending doubts"))?)
    }

    /// # Errors
    ///
    /// Returns `InboxError::Storage` if the doubts cannot be read.
    pub async fn student_doubts(&self, student: &StudentId) -> Result<Vec<Doubt>, InboxError> {
        Ok(self
            .doubts
            .student_doubts(student)
            .await
            .map_err(logged("listing student doubts"))?)
    }

    /// # Errors
    ///
    /// Returns `InboxError::Storage` for an unknown doubt.
    pub async fn resolve_doubt(&self, id: DoubtId) -> Result<(), InboxError> {
        self.doubts
            .resolve_doubt(id)
            .await
            .map_err(logged("resolving a doubt"))?;
        tracing::info!(doubt = %id, "doubt resolved");
        Ok(())
    }

    /// Answer and resolve a doubt.
    ///
    /// # Errors
    ///
    /// Returns `InboxError::Invalid` for a blank answer, or
    /// `InboxError::Storage` for an unknown doubt.
    pub async fn answer_doubt(&self, id: DoubtId, text: &str) -> Result<(), InboxError> {
        let answer = DoubtAnswer::new(text)?;
        self.doubts
            .answer_doubt(id, &answer)
            .await
            .map_err(logged("answering a doubt"))?;
        tracing::info!(doubt = %id, "doubt answered");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InboxError::Invalid` for a blank remark, or
    /// `InboxError::Storage` if the student is unknown or has no parent.
    pub async fn send_complaint(
        &self,
        teacher: &TeacherId,
        student: &StudentId,
        remark: &str,
    ) -> Result<(), InboxError> {
        let complaint = NewComplaint::new(teacher.clone(), student.clone(), remark)?;
        self.complaints
            .send_complaint(&complaint)
            .await
            .map_err(logged("sending a complaint"))?;
        tracing::info!(teacher = %teacher, student = %student, "complaint sent");
        Ok(())
    }

    /// Complaints a parent received, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InboxError::Storage` if the complaints cannot be read.
    pub async fn complaints_for(&self, parent: &ParentId) -> Result<Vec<Complaint>, InboxError> {
        Ok(self
            .complaints
            .parent_complaints(parent)
            .await
            .map_err(logged("listing complaints"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{
        HistoricalMarks, MessageError, Parent, StudentRecord, SubjectMarks, Teacher,
    };
    use storage::InMemoryRepository;

    fn sid() -> StudentId {
        StudentId::new("S001").unwrap()
    }

    fn tid() -> TeacherId {
        TeacherId::new("T001").unwrap()
    }

    fn inbox() -> InboxService {
        let repo = InMemoryRepository::new();
        repo.upsert_student(
            StudentRecord::new(
                sid(),
                "Ana Ruiz",
                "10A",
                92.0,
                SubjectMarks::from_pairs([("Math", 85.0)]).unwrap(),
                HistoricalMarks::new(),
            )
            .unwrap(),
        )
        .unwrap();
        repo.upsert_teacher(Teacher {
            id: tid(),
            name: "Mr. Lee".into(),
        })
        .unwrap();
        repo.upsert_parent(Parent {
            id: ParentId::new("P001").unwrap(),
            name: "Mrs. Johnson".into(),
            children: vec![sid()],
        })
        .unwrap();
        let repo = Arc::new(repo);
        InboxService::new(repo.clone(), repo)
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_storage() {
        let err = inbox().ask_doubt(&sid(), None, "  ").await.unwrap_err();
        assert!(matches!(err, InboxError::Invalid(MessageError::EmptyQuestion)));
    }

    #[tokio::test]
    async fn answered_doubt_shows_up_for_the_student() {
        let inbox = inbox();
        inbox
            .ask_doubt(&sid(), Some(tid()), "What is a prime?")
            .await
            .unwrap();
        let pending = inbox.pending_doubts(&tid()).await.unwrap();
        assert_eq!(pending.len(), 1);

        assert!(matches!(
            inbox.answer_doubt(pending[0].id, "").await,
            Err(InboxError::Invalid(MessageError::EmptyAnswer))
        ));
        inbox
            .answer_doubt(pending[0].id, "Divisible only by 1 and itself.")
            .await
            .unwrap();

        assert!(inbox.pending_doubts(&tid()).await.unwrap().is_empty());
        let mine = inbox.student_doubts(&sid()).await.unwrap();
        assert_eq!(
            mine[0].answer.as_deref(),
            Some("Divisible only by 1 and itself.")
        );
    }

    #[tokio::test]
    async fn complaint_reaches_the_parent() {
        let inbox = inbox();
        inbox
            .send_complaint(&tid(), &sid(), "Missed two assignments")
            .await
            .unwrap();
        let received = inbox
            .complaints_for(&ParentId::new("P001").unwrap())
            .await
            .unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].teacher_name, "Mr. Lee");
        assert_eq!(received[0].remark, "Missed two assignments");
    }

    #[tokio::test]
    async fn unknown_doubt_is_a_storage_error() {
        let err = inbox().resolve_doubt(DoubtId::new(42)).await.unwrap_err();
        assert!(matches!(err, InboxError::Storage(StorageError::NotFound)));
    }
}

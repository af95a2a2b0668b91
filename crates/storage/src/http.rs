use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use classroom_core::model::{
    Complaint, Doubt, DoubtAnswer, DoubtId, NewComplaint, NewDoubt, ParentId, QuizAttempt,
    QuizAttemptRecord, StudentId, StudentRecord, TeacherId,
};

use crate::repository::{
    ComplaintRepository, DoubtRepository, QuizAttemptRepository, StorageError, StudentRepository,
};
use crate::wire::{
    AckResponse, AnswerDoubtRequest, AskDoubtRequest, ChildrenResponse, ComplaintRequest,
    ComplaintsResponse, DoubtsResponse, HistoryResponse, StudentPayload, valid_records,
};

/// Client for the school backend's JSON API.
///
/// Endpoints live under `{base_url}/api`. Requests are not retried.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        decode(check_status(response).await?).await
    }

    /// POST `body` and require `{"success": true}` back.
    async fn post_ack<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), StorageError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        let ack: AckResponse = decode(check_status(response).await?).await?;
        accepted(status, ack.success, ack.message)
    }
}

fn accepted(status: u16, success: bool, message: Option<String>) -> Result<(), StorageError> {
    if success {
        Ok(())
    } else {
        Err(StorageError::Rejected {
            status,
            message: message.unwrap_or_default(),
        })
    }
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StorageError::NotFound);
    }
    let message = response
        .json::<AckResponse>()
        .await
        .ok()
        .and_then(|ack| ack.message)
        .unwrap_or_else(|| status.to_string());
    Err(StorageError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    response
        .json::<T>()
        .await
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

#[async_trait]
impl StudentRepository for HttpBackend {
    // The backend has no single-student read; the dashboard list is the source.
    async fn fetch_student(&self, id: &StudentId) -> Result<StudentRecord, StorageError> {
        let payloads: Vec<StudentPayload> = self.get_json("teacher/dashboard").await?;
        let found = payloads
            .into_iter()
            .find(|p| p.id() == id.as_str())
            .ok_or(StorageError::NotFound)?;
        found.into_record()
    }

    async fn list_students(&self) -> Result<Vec<StudentRecord>, StorageError> {
        let payloads: Vec<StudentPayload> = self.get_json("teacher/dashboard").await?;
        Ok(valid_records(payloads))
    }

    async fn children_of(&self, parent: &ParentId) -> Result<Vec<StudentRecord>, StorageError> {
        let body: ChildrenResponse = self.get_json(&format!("parent/children/{parent}")).await?;
        Ok(valid_records(body.children))
    }
}

#[async_trait]
impl DoubtRepository for HttpBackend {
    async fn ask_doubt(&self, doubt: &NewDoubt) -> Result<(), StorageError> {
        self.post_ack("student/ask-doubt", &AskDoubtRequest::from(doubt))
            .await
    }

    async fn pending_doubts(&self, teacher: &TeacherId) -> Result<Vec<Doubt>, StorageError> {
        let body: DoubtsResponse = self.get_json(&format!("teacher/doubts/{teacher}")).await?;
        accepted(StatusCode::OK.as_u16(), body.success, body.message)?;
        body.doubts.into_iter().map(|row| row.into_doubt()).collect()
    }

    async fn student_doubts(&self, student: &StudentId) -> Result<Vec<Doubt>, StorageError> {
        let body: DoubtsResponse = self.get_json(&format!("student/doubts/{student}")).await?;
        accepted(StatusCode::OK.as_u16(), body.success, body.message)?;
        body.doubts.into_iter().map(|row| row.into_doubt()).collect()
    }

    async fn resolve_doubt(&self, id: DoubtId) -> Result<(), StorageError> {
        self.post_ack(&format!("doubts/resolve/{id}"), &serde_json::json!({}))
            .await
    }

    async fn answer_doubt(&self, id: DoubtId, answer: &DoubtAnswer) -> Result<(), StorageError> {
        let body = AnswerDoubtRequest {
            answer_text: answer.as_str(),
        };
        self.post_ack(&format!("doubts/answer/{id}"), &body).await
    }
}

#[async_trait]
impl ComplaintRepository for HttpBackend {
    async fn send_complaint(&self, complaint: &NewComplaint) -> Result<(), StorageError> {
        self.post_ack("teacher/complaint", &ComplaintRequest::from(complaint))
            .await
    }

    async fn parent_complaints(&self, parent: &ParentId) -> Result<Vec<Complaint>, StorageError> {
        let body: ComplaintsResponse =
            self.get_json(&format!("parent/complaints/{parent}")).await?;
        accepted(StatusCode::OK.as_u16(), body.success, body.message)?;
        body.complaints
            .into_iter()
            .map(|row| row.into_complaint())
            .collect()
    }
}

#[async_trait]
impl QuizAttemptRepository for HttpBackend {
    async fn submit_quiz_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError> {
        tracing::debug!(student = %attempt.student_id, "submitting quiz attempt");
        self.post_ack("student/quiz/attempt", attempt).await
    }

    async fn quiz_history(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<QuizAttemptRecord>, StorageError> {
        let body: HistoryResponse = self
            .get_json(&format!("student/quiz/history/{student_id}"))
            .await?;
        accepted(StatusCode::OK.as_u16(), body.success, body.message)?;
        body.history
            .into_iter()
            .map(|row| row.into_record())
            .collect()
    }
}

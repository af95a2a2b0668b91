//! Shared error types for the services crate.

use thiserror::Error;

use classroom_core::model::{MessageError, QuizSummaryError};
use storage::StorageError;

use crate::quiz::QuizState;
use crate::view::{Role, Screen};

/// Errors emitted by the quiz state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions available for subject {subject:?}")]
    NoQuestionsAvailable { subject: String },
    #[error("no option selected for the current question")]
    NoSelectionMade,
    #[error("{option:?} is not an option of the current question")]
    UnknownOption { option: String },
    #[error("cannot {operation} while the quiz is {state}")]
    InvalidState {
        operation: &'static str,
        state: QuizState,
    },
    #[error(transparent)]
    Summary(#[from] QuizSummaryError),
}

/// Errors emitted while recording or listing quiz attempts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AiProxyClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI suggestions are not configured")]
    Disabled,
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("AI proxy returned an empty response")]
    EmptyResponse,
    #[error("AI proxy failed with status {status}: {message}")]
    Proxy {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the view controller state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ViewError {
    #[error("log in before opening {screen:?}")]
    NotLoggedIn { screen: Screen },
    #[error("{role} cannot open {screen:?}")]
    Forbidden { role: Role, screen: Screen },
}

/// Errors emitted by `InboxService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InboxError {
    #[error(transparent)]
    Invalid(#[from] MessageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while building reports from backend data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

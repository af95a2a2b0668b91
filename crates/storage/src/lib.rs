#![forbid(unsafe_code)]

pub mod http;
pub mod question_bank;
pub mod repository;
mod wire;

pub use http::HttpBackend;
pub use question_bank::{QuestionBank, QuestionBankError};
pub use repository::{
    ComplaintRepository, DoubtRepository, InMemoryRepository, QuizAttemptRepository, Storage,
    StorageError, StudentRepository,
};

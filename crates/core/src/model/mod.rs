mod ids;
mod message;
mod question;
mod quiz;
mod student;

pub use ids::{
    AttemptId, ComplaintId, DoubtId, ParentId, ParseIdError, QuestionId, StudentId, TeacherId,
};
pub use message::{
    Complaint, Doubt, DoubtAnswer, MessageError, NewComplaint, NewDoubt, Parent, Teacher,
};

pub use question::{Question, QuestionError, QuestionRecord};
pub use quiz::{
    AccuracyBand, AnswerResult, QuizAttempt, QuizAttemptRecord, QuizSummary, QuizSummaryError,
    TopicBreakdown, topic_breakdown,
};
pub use student::{
    HistoricalMarks, StudentRecord, StudentRecordError, SubjectMarks, SubjectScore,
};

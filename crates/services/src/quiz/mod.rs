mod plan;
mod progress;
mod session;
mod workflow;

pub use crate::error::QuizError;
pub use plan::{DrawnQuestion, QuizBuilder, QuizPlan};
pub use progress::QuizProgress;
pub use session::{QuizSession, QuizState};
pub use workflow::QuizLoopService;

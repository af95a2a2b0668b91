#![forbid(unsafe_code)]

pub mod ai;
pub mod error;
pub mod inbox;
pub mod quiz;
pub mod report;
pub mod view;

pub use classroom_core::Clock;

pub use ai::{AiProxyClient, AiProxyConfig, parse_suggestions};
pub use error::{AiError, AttemptError, InboxError, QuizError, ReportError, ViewError};
pub use inbox::InboxService;
pub use quiz::{QuizLoopService, QuizProgress, QuizSession, QuizState};
pub use report::{ClassOverview, FamilyOverview, ReportService, StudentOverview, SubjectGap};
pub use view::{AppState, Role, Screen, SessionUser};

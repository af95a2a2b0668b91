//! Which screen is visible for whom.
//!
//! `AppState` replaces ambient "current user / current view" globals with one
//! owned value. The binary asks it before rendering anything.

use std::fmt;
use std::str::FromStr;

use classroom_core::model::StudentId;

use crate::error::ViewError;
use crate::quiz::QuizSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Teacher,
    Student,
    Parent,
}

impl Role {
    /// Screen shown right after login.
    #[must_use]
    pub fn home(self) -> Screen {
        match self {
            Self::Teacher => Screen::TeacherDashboard,
            Self::Student => Screen::StudentDashboard,
            Self::Parent => Screen::ParentDashboard,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Parent => "parent",
        })
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            "parent" => Ok(Self::Parent),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    TeacherDashboard,
    StudentDetail(StudentId),
    /// Doubts waiting for the logged-in teacher.
    DoubtQueue,
    StudentDashboard,
    Quiz,
    QuizAnalysis,
    QuizHistory,
    ProgressTracker,
    /// The student's own doubts and their answers.
    MyDoubts,
    TutorChat,
    ParentDashboard,
    ChildDetail(StudentId),
    Complaints,
}

impl Screen {
    /// Whether a logged-in user with `role` may open this screen.
    #[must_use]
    pub fn is_open_to(&self, role: Role) -> bool {
        match self {
            Self::Login => false,
            Self::TeacherDashboard | Self::StudentDetail(_) | Self::DoubtQueue => {
                role == Role::Teacher
            }
            Self::StudentDashboard
            | Self::Quiz
            | Self::QuizAnalysis
            | Self::QuizHistory
            | Self::ProgressTracker
            | Self::MyDoubts
            | Self::TutorChat => role == Role::Student,
            Self::ParentDashboard | Self::ChildDetail(_) | Self::Complaints => {
                role == Role::Parent
            }
        }
    }

    fn keeps_quiz(&self) -> bool {
        matches!(self, Self::Quiz | Self::QuizAnalysis)
    }
}

/// The logged-in account as returned by the backend's login call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug)]
pub struct AppState {
    role: Option<Role>,
    user: Option<SessionUser>,
    screen: Screen,
    quiz: Option<QuizSession>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            role: None,
            user: None,
            screen: Screen::Login,
            quiz: None,
        }
    }
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.role.is_some()
    }

    /// Log in and land on the role's home screen. Replaces any previous login.
    pub fn login(&mut self, role: Role, user: SessionUser) -> &Screen {
        tracing::info!(%role, user = %user.id, "logged in");
        self.role = Some(role);
        self.user = Some(user);
        self.quiz = None;
        self.screen = role.home();
        &self.screen
    }

    /// Forget the user and return to the login screen.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user = %user.id, "logged out");
        }
        self.role = None;
        self.quiz = None;
        self.screen = Screen::Login;
    }

    /// Switch screens. Leaving the quiz screens drops the active quiz.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::NotLoggedIn` before login and
    /// `ViewError::Forbidden` if the role may not open `screen`.
    pub fn navigate(&mut self, screen: Screen) -> Result<(), ViewError> {
        let Some(role) = self.role else {
            if screen == Screen::Login {
                return Ok(());
            }
            return Err(ViewError::NotLoggedIn { screen });
        };
        if !screen.is_open_to(role) {
            return Err(ViewError::Forbidden { role, screen });
        }
        if !screen.keeps_quiz() && self.quiz.take().is_some() {
            tracing::debug!("quiz discarded on navigation");
        }
        tracing::debug!(from = ?self.screen, to = ?screen, "navigate");
        self.screen = screen;
        Ok(())
    }

    /// Make `session` the active quiz and show the quiz screen.
    ///
    /// # Errors
    ///
    /// Same as `navigate` for `Screen::Quiz`.
    pub fn begin_quiz(&mut self, session: QuizSession) -> Result<&mut QuizSession, ViewError> {
        self.navigate(Screen::Quiz)?;
        Ok(self.quiz.insert(session))
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    pub fn quiz_mut(&mut self) -> Option<&mut QuizSession> {
        self.quiz.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> SessionUser {
        SessionUser {
            id: id.into(),
            name: format!("User {id}"),
        }
    }

    fn child() -> StudentId {
        StudentId::new("S001").unwrap()
    }

    #[test]
    fn starts_logged_out_on_login_screen() {
        let state = AppState::new();
        assert!(!state.is_logged_in());
        assert_eq!(state.screen(), &Screen::Login);
    }

    #[test]
    fn navigation_before_login_is_rejected() {
        let mut state = AppState::new();
        let err = state.navigate(Screen::Quiz).unwrap_err();
        assert_eq!(err, ViewError::NotLoggedIn { screen: Screen::Quiz });
        assert!(state.navigate(Screen::Login).is_ok());
    }

    #[test]
    fn login_lands_on_role_home() {
        let mut state = AppState::new();
        assert_eq!(
            state.login(Role::Parent, user("P1")),
            &Screen::ParentDashboard
        );
        assert_eq!(state.role(), Some(Role::Parent));
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("P1"));
    }

    #[test]
    fn roles_only_open_their_own_screens() {
        let mut state = AppState::new();
        state.login(Role::Parent, user("P1"));
        assert!(state.navigate(Screen::ChildDetail(child())).is_ok());
        let err = state.navigate(Screen::StudentDetail(child())).unwrap_err();
        assert_eq!(
            err,
            ViewError::Forbidden {
                role: Role::Parent,
                screen: Screen::StudentDetail(child())
            }
        );
        assert_eq!(state.screen(), &Screen::ChildDetail(child()));
    }

    #[test]
    fn login_screen_needs_logout() {
        let mut state = AppState::new();
        state.login(Role::Teacher, user("T1"));
        assert!(state.navigate(Screen::Login).is_err());
        state.logout();
        assert!(!state.is_logged_in());
        assert!(state.user().is_none());
        assert_eq!(state.screen(), &Screen::Login);
    }

    #[test]
    fn leaving_the_quiz_drops_the_session() {
        let mut state = AppState::new();
        state.login(Role::Student, user("S001"));
        state.begin_quiz(QuizSession::new()).unwrap();
        assert_eq!(state.screen(), &Screen::Quiz);

        state.navigate(Screen::QuizAnalysis).unwrap();
        assert!(state.quiz().is_some());

        state.navigate(Screen::QuizHistory).unwrap();
        assert!(state.quiz().is_none());
    }

    #[test]
    fn teachers_cannot_take_quizzes() {
        let mut state = AppState::new();
        state.login(Role::Teacher, user("T1"));
        assert!(state.begin_quiz(QuizSession::new()).is_err());
        assert!(state.quiz().is_none());
    }

    #[test]
    fn messaging_screens_belong_to_one_role_each() {
        assert!(Screen::DoubtQueue.is_open_to(Role::Teacher));
        assert!(!Screen::DoubtQueue.is_open_to(Role::Student));
        assert!(Screen::MyDoubts.is_open_to(Role::Student));
        assert!(Screen::TutorChat.is_open_to(Role::Student));
        assert!(!Screen::TutorChat.is_open_to(Role::Parent));
        assert!(Screen::Complaints.is_open_to(Role::Parent));
        assert!(!Screen::Complaints.is_open_to(Role::Teacher));

        let mut state = AppState::new();
        state.login(Role::Student, user("S001"));
        let err = state.navigate(Screen::Complaints).unwrap_err();
        assert_eq!(
            err,
            ViewError::Forbidden {
                role: Role::Student,
                screen: Screen::Complaints
            }
        );
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert!("admin".parse::<Role>().is_err());
    }
}

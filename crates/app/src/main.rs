mod chat;
mod config;
mod logging;
mod prompts;
mod quiz_runner;
mod render;

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use classroom_core::model::{DoubtId, ParentId, StudentId, TeacherId};
use services::{
    AiProxyClient, AiProxyConfig, AppState, Clock, InboxService, QuizLoopService, ReportService,
    Role, Screen, SessionUser, StudentOverview, parse_suggestions,
};
use storage::{QuestionBank, Storage};

use crate::config::Config;

const DEFAULT_QUESTION_COUNT: usize = 5;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidId { flag: &'static str, raw: String },
    InvalidRole { raw: String },
    MissingFlag { command: &'static str, flag: &'static str },
    Conflicting { first: &'static str, second: &'static str },
    MissingSubject,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
            ArgsError::InvalidRole { raw } => write!(f, "invalid --as value: {raw}"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::Conflicting { first, second } => {
                write!(f, "{first} and {second} cannot be used together")
            }
            ArgsError::MissingSubject => write!(f, "quiz requires --subject"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn parse_id<T: TryFrom<String>>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    T::try_from(raw.clone()).map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  classroom quiz    --subject <name> [--count <n>] [--student <id>] [--seed <n>]");
    eprintln!("  classroom report  --student <id> [--as teacher|parent|student]");
    eprintln!("  classroom class   [--suggest]");
    eprintln!("  classroom history --student <id>");
    eprintln!("  classroom chat    --student <id>");
    eprintln!("  classroom ask     --student <id> [--teacher <id>] --text <question>");
    eprintln!("  classroom doubts  --student <id>");
    eprintln!("  classroom queue   --teacher <id> [--answer <doubt> --text <answer> | --resolve <doubt>]");
    eprintln!("  classroom complain  --teacher <id> --student <id> --text <remark>");
    eprintln!("  classroom complaints --parent <id>");
    eprintln!("  classroom family  --parent <id> [--child <id>]");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --questions <path>  --students <path>  --api <url>  --ai <url>  --log <filter>");
    eprintln!();
    eprintln!("Environment (.env is read too):");
    eprintln!("  CLASSROOM_QUESTIONS (default quizdata.json), CLASSROOM_STUDENTS,");
    eprintln!("  CLASSROOM_API_URL, CLASSROOM_AI_URL, CLASSROOM_LOG (default info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Report,
    Class,
    History,
    Chat,
    Ask,
    Doubts,
    Queue,
    Complain,
    Complaints,
    Family,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "report" => Some(Self::Report),
            "class" => Some(Self::Class),
            "history" => Some(Self::History),
            "chat" => Some(Self::Chat),
            "ask" => Some(Self::Ask),
            "doubts" => Some(Self::Doubts),
            "queue" => Some(Self::Queue),
            "complain" => Some(Self::Complain),
            "complaints" => Some(Self::Complaints),
            "family" => Some(Self::Family),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    command: Command,
    subject: Option<String>,
    count: usize,
    student: Option<StudentId>,
    seed: Option<u64>,
    role: Role,
    suggest: bool,
    teacher: Option<TeacherId>,
    parent: Option<ParentId>,
    child: Option<StudentId>,
    text: Option<String>,
    answer: Option<DoubtId>,
    resolve: Option<DoubtId>,
}

impl Args {
    /// Parse the command line, writing flag overrides into `config`.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        config: &mut Config,
    ) -> Result<Self, ArgsError> {
        let command = match args.next() {
            None => {
                print_usage();
                std::process::exit(2);
            }
            Some(first) if first == "--help" || first == "-h" => {
                print_usage();
                std::process::exit(0);
            }
            Some(first) => Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?,
        };

        let mut parsed = Self {
            command,
            subject: None,
            count: DEFAULT_QUESTION_COUNT,
            student: None,
            seed: None,
            role: Role::Teacher,
            suggest: false,
            teacher: None,
            parent: None,
            child: None,
            text: None,
            answer: None,
            resolve: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--subject" => parsed.subject = Some(require_value(args, "--subject")?),
                "--count" => parsed.count = parse_number(require_value(args, "--count")?, "--count")?,
                "--seed" => parsed.seed = Some(parse_number(require_value(args, "--seed")?, "--seed")?),
                "--student" => {
                    parsed.student = Some(parse_id(require_value(args, "--student")?, "--student")?);
                }
                "--teacher" => {
                    parsed.teacher = Some(parse_id(require_value(args, "--teacher")?, "--teacher")?);
                }
                "--parent" => {
                    parsed.parent = Some(parse_id(require_value(args, "--parent")?, "--parent")?);
                }
                "--child" => parsed.child = Some(parse_id(require_value(args, "--child")?, "--child")?),
                "--text" => parsed.text = Some(require_value(args, "--text")?),
                "--answer" => {
                    parsed.answer = Some(parse_number(require_value(args, "--answer")?, "--answer")?);
                }
                "--resolve" => {
                    parsed.resolve =
                        Some(parse_number(require_value(args, "--resolve")?, "--resolve")?);
                }
                "--as" => {
                    let raw = require_value(args, "--as")?;
                    parsed.role = raw.parse().map_err(|_| ArgsError::InvalidRole { raw })?;
                }
                "--suggest" => parsed.suggest = true,
                "--questions" => {
                    config.questions_path = PathBuf::from(require_value(args, "--questions")?);
                }
                "--students" => {
                    config.students_path = Some(PathBuf::from(require_value(args, "--students")?));
                }
                "--api" => config.api_url = Some(require_value(args, "--api")?),
                "--ai" => config.ai_url = Some(require_value(args, "--ai")?),
                "--log" => config.log_level = require_value(args, "--log")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn require_student(&self, command: &'static str) -> Result<StudentId, ArgsError> {
        self.student.clone().ok_or(ArgsError::MissingFlag {
            command,
            flag: "--student",
        })
    }

    fn require_teacher(&self, command: &'static str) -> Result<TeacherId, ArgsError> {
        self.teacher.clone().ok_or(ArgsError::MissingFlag {
            command,
            flag: "--teacher",
        })
    }

    fn require_parent(&self, command: &'static str) -> Result<ParentId, ArgsError> {
        self.parent.clone().ok_or(ArgsError::MissingFlag {
            command,
            flag: "--parent",
        })
    }

    fn require_text(&self, command: &'static str) -> Result<&str, ArgsError> {
        self.text.as_deref().ok_or(ArgsError::MissingFlag {
            command,
            flag: "--text",
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let mut config = Config::from_env();
    let args = Args::parse(&mut std::env::args().skip(1), &mut config).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    logging::init_tracing(&config.log_level);
    let storage = config.storage()?;
    let ai = AiProxyClient::new(config.ai_url.as_deref().map(AiProxyConfig::new));
    let mut state = AppState::new();

    match args.command {
        Command::Quiz => run_quiz(&args, &config, &storage, &ai, &mut state).await,
        Command::Report => run_report(&args, &storage, &ai, &mut state).await,
        Command::Class => run_class(&args, &storage, &ai, &mut state).await,
        Command::History => run_history(&args, &storage, &mut state).await,
        Command::Chat => run_chat(&args, &storage, &ai, &mut state).await,
        Command::Ask | Command::Doubts => run_student_doubts(&args, &storage, &mut state).await,
        Command::Queue => run_queue(&args, &storage, &mut state).await,
        Command::Complain => run_complain(&args, &storage, &mut state).await,
        Command::Complaints => run_complaints(&args, &storage, &mut state).await,
        Command::Family => run_family(&args, &storage, &mut state).await,
    }
}

fn inbox(storage: &Storage) -> InboxService {
    InboxService::new(Arc::clone(&storage.doubts), Arc::clone(&storage.complaints))
}

fn account_user(id: &impl ToString) -> SessionUser {
    let id = id.to_string();
    SessionUser {
        name: id.clone(),
        id,
    }
}

async fn session_user(storage: &Storage, student: Option<&StudentId>) -> SessionUser {
    let Some(id) = student else {
        return SessionUser {
            id: "guest".into(),
            name: "Guest".into(),
        };
    };
    let name = match storage.students.fetch_student(id).await {
        Ok(record) => record.name().to_owned(),
        Err(err) => {
            tracing::warn!(student = %id, error = %err, "student lookup failed");
            id.to_string()
        }
    };
    SessionUser {
        id: id.to_string(),
        name,
    }
}

async fn run_quiz(
    args: &Args,
    config: &Config,
    storage: &Storage,
    ai: &AiProxyClient,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank = Arc::new(QuestionBank::load(&config.questions_path)?);
    let mut quizzes = QuizLoopService::new(Clock::system(), bank, Arc::clone(&storage.attempts));
    if let Some(seed) = args.seed {
        quizzes = quizzes.with_seed(seed);
    }

    let Some(subject) = args.subject.as_deref() else {
        eprintln!("Available subjects: {}", quizzes.subjects().join(", "));
        return Err(ArgsError::MissingSubject.into());
    };

    let user = session_user(storage, args.student.as_ref()).await;
    state.login(Role::Student, user);
    let session = quizzes.start_quiz(subject, args.count)?;
    let session = state.begin_quiz(session)?;

    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();
    quiz_runner::run_quiz(session, &mut input, &mut out, ai).await?;
    let summary = quizzes.finish_quiz(session)?;

    state.navigate(Screen::QuizAnalysis)?;
    render::print_summary(&mut out, &summary)?;

    if let Some(id) = &args.student {
        match quizzes.submit_attempt(id, &summary).await {
            Ok(_) => writeln!(out, "Saved to your quiz history.")?,
            Err(err) => writeln!(out, "Could not save quiz results to your history: {err}")?,
        }
    }
    Ok(())
}

async fn run_report(
    args: &Args,
    storage: &Storage,
    ai: &AiProxyClient,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = args.require_student("report")?;
    let screen = match args.role {
        Role::Teacher => Screen::StudentDetail(id.clone()),
        Role::Parent => Screen::ChildDetail(id.clone()),
        Role::Student => Screen::ProgressTracker,
    };
    let user = session_user(storage, Some(&id)).await;
    state.login(args.role, user);
    state.navigate(screen)?;

    let reports = ReportService::new(Arc::clone(&storage.students));
    let overview = reports.student_overview(&id).await?;
    let mut out = io::stdout().lock();
    render::print_student(&mut out, &overview)?;

    if args.role == Role::Parent && ai.enabled() {
        match ai.generate(&prompts::parent_note(&overview)).await {
            Ok(note) => writeln!(out, "\nA note from the teacher:\n{note}")?,
            Err(err) => tracing::warn!(error = %err, "no teacher note"),
        }
    }
    Ok(())
}

async fn run_class(
    args: &Args,
    storage: &Storage,
    ai: &AiProxyClient,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    state.login(
        Role::Teacher,
        SessionUser {
            id: "teacher".into(),
            name: "Teacher".into(),
        },
    );
    state.navigate(Screen::TeacherDashboard)?;

    let reports = ReportService::new(Arc::clone(&storage.students));
    let class = reports.class_overview().await?;
    let mut out = io::stdout().lock();
    render::print_class(&mut out, &class)?;

    if !args.suggest {
        return Ok(());
    }
    if !ai.enabled() {
        writeln!(out, "\nSuggestions need CLASSROOM_AI_URL or --ai.")?;
        return Ok(());
    }
    let students = storage.students.list_students().await?;
    let overviews: Vec<StudentOverview> = students
        .iter()
        .map(|s| StudentOverview::from_record(s, &Default::default()))
        .collect();
    let needing: Vec<&StudentOverview> =
        overviews.iter().filter(|s| prompts::needs_support(s)).collect();
    if needing.is_empty() {
        writeln!(out, "\nAll students are performing well!")?;
        return Ok(());
    }
    let reply = ai.generate(&prompts::class_suggestions(&needing)).await?;
    writeln!(out, "\nSuggestions:")?;
    for item in parse_suggestions(&reply) {
        writeln!(out, "  - {item}")?;
    }
    Ok(())
}

async fn run_history(
    args: &Args,
    storage: &Storage,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = args.require_student("history")?;
    let user = session_user(storage, Some(&id)).await;
    state.login(Role::Student, user);
    state.navigate(Screen::QuizHistory)?;

    let quizzes = QuizLoopService::new(
        Clock::system(),
        Arc::new(QuestionBank::default()),
        Arc::clone(&storage.attempts),
    );
    let history = quizzes.history(&id).await?;
    render::print_history(&mut io::stdout().lock(), &history)?;
    Ok(())
}

async fn run_chat(
    args: &Args,
    storage: &Storage,
    ai: &AiProxyClient,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = args.require_student("chat")?;
    let user = session_user(storage, Some(&id)).await;
    state.login(Role::Student, user);
    state.navigate(Screen::TutorChat)?;

    let overview = ReportService::new(Arc::clone(&storage.students))
        .student_overview(&id)
        .await?;
    let mut out = io::stdout().lock();
    if !ai.enabled() {
        writeln!(out, "The tutor needs CLASSROOM_AI_URL or --ai.")?;
        return Ok(());
    }
    chat::run_chat(&overview, &mut io::stdin().lock(), &mut out, ai).await
}

async fn run_student_doubts(
    args: &Args,
    storage: &Storage,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let command = if args.command == Command::Ask { "ask" } else { "doubts" };
    let id = args.require_student(command)?;
    let user = session_user(storage, Some(&id)).await;
    state.login(Role::Student, user);
    state.navigate(Screen::MyDoubts)?;

    let inbox = inbox(storage);
    let mut out = io::stdout().lock();
    if args.command == Command::Ask {
        inbox
            .ask_doubt(&id, args.teacher.clone(), args.require_text(command)?)
            .await?;
        writeln!(out, "Doubt sent.")?;
    }
    render::print_doubts(&mut out, &inbox.student_doubts(&id).await?)?;
    Ok(())
}

async fn run_queue(
    args: &Args,
    storage: &Storage,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let teacher = args.require_teacher("queue")?;
    state.login(Role::Teacher, account_user(&teacher));
    state.navigate(Screen::DoubtQueue)?;

    let inbox = inbox(storage);
    let mut out = io::stdout().lock();
    match (args.answer, args.resolve) {
        (Some(_), Some(_)) => {
            return Err(ArgsError::Conflicting {
                first: "--answer",
                second: "--resolve",
            }
            .into());
        }
        (Some(id), None) => {
            inbox.answer_doubt(id, args.require_text("queue --answer")?).await?;
            writeln!(out, "Answered doubt #{id}.")?;
        }
        (None, Some(id)) => {
            inbox.resolve_doubt(id).await?;
            writeln!(out, "Resolved doubt #{id}.")?;
        }
        (None, None) => {}
    }
    render::print_doubts(&mut out, &inbox.pending_doubts(&teacher).await?)?;
    Ok(())
}

async fn run_complain(
    args: &Args,
    storage: &Storage,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let teacher = args.require_teacher("complain")?;
    let student = args.require_student("complain")?;
    state.login(Role::Teacher, account_user(&teacher));
    state.navigate(Screen::StudentDetail(student.clone()))?;

    inbox(storage)
        .send_complaint(&teacher, &student, args.require_text("complain")?)
        .await?;
    writeln!(io::stdout().lock(), "Complaint sent to the parent of {student}.")?;
    Ok(())
}

async fn run_complaints(
    args: &Args,
    storage: &Storage,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let parent = args.require_parent("complaints")?;
    state.login(Role::Parent, account_user(&parent));
    state.navigate(Screen::Complaints)?;

    let complaints = inbox(storage).complaints_for(&parent).await?;
    render::print_complaints(&mut io::stdout().lock(), &complaints)?;
    Ok(())
}

async fn run_family(
    args: &Args,
    storage: &Storage,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let parent = args.require_parent("family")?;
    state.login(Role::Parent, account_user(&parent));

    let family = ReportService::new(Arc::clone(&storage.students))
        .family_overview(&parent)
        .await?;
    let mut out = io::stdout().lock();
    let Some(child_id) = &args.child else {
        render::print_family(&mut out, &family)?;
        return Ok(());
    };
    state.navigate(Screen::ChildDetail(child_id.clone()))?;
    let Some(child) = family.child(child_id) else {
        writeln!(out, "{child_id} is not linked to this account.")?;
        return Ok(());
    };
    render::print_student(&mut out, child)?;
    render::print_gaps(&mut out, &family.compare_with_topper(child))?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            questions_path: PathBuf::from("quizdata.json"),
            students_path: None,
            api_url: None,
            ai_url: None,
            log_level: "info".into(),
        }
    }

    fn parse(argv: &[&str], config: &mut Config) -> Result<Args, ArgsError> {
        let mut iter = argv.iter().map(|s| (*s).to_string());
        Args::parse(&mut iter, config)
    }

    #[test]
    fn quiz_flags_are_parsed() {
        let mut config = config();
        let args = parse(
            &["quiz", "--subject", "Math", "--count", "3", "--student", "S001", "--seed", "9"],
            &mut config,
        )
        .unwrap();
        assert_eq!(args.command, Command::Quiz);
        assert_eq!(args.subject.as_deref(), Some("Math"));
        assert_eq!(args.count, 3);
        assert_eq!(args.student.as_ref().map(StudentId::as_str), Some("S001"));
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn flags_override_config() {
        let mut config = config();
        parse(
            &["class", "--api", "http://localhost:5000", "--log", "debug", "--questions", "q.json"],
            &mut config,
        )
        .unwrap();
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.questions_path, PathBuf::from("q.json"));
    }

    #[test]
    fn bad_input_is_reported() {
        let mut config = config();
        assert!(matches!(
            parse(&["grade"], &mut config),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse(&["quiz", "--count", "many"], &mut config),
            Err(ArgsError::InvalidNumber { flag: "--count", .. })
        ));
        assert!(matches!(
            parse(&["report", "--as", "admin"], &mut config),
            Err(ArgsError::InvalidRole { .. })
        ));
        assert!(matches!(
            parse(&["history", "--student", "  "], &mut config),
            Err(ArgsError::InvalidId { flag: "--student", .. })
        ));
        assert!(matches!(
            parse(&["quiz", "--subject"], &mut config),
            Err(ArgsError::MissingValue { flag: "--subject" })
        ));
    }

    #[test]
    fn report_defaults_to_teacher_view() {
        let mut config = config();
        let args = parse(&["report", "--student", "S1"], &mut config).unwrap();
        assert_eq!(args.role, Role::Teacher);
        assert!(args.require_student("report").is_ok());
        let args = parse(&["report"], &mut config).unwrap();
        assert!(matches!(
            args.require_student("report"),
            Err(ArgsError::MissingFlag {
                command: "report",
                flag: "--student"
            })
        ));
    }

    #[test]
    fn messaging_flags_are_parsed() {
        let mut config = config();
        let args = parse(
            &["queue", "--teacher", "T001", "--answer", "12", "--text", "Use the formula."],
            &mut config,
        )
        .unwrap();
        assert_eq!(args.command, Command::Queue);
        assert_eq!(args.teacher.as_ref().map(TeacherId::as_str), Some("T001"));
        assert_eq!(args.answer, Some(DoubtId::new(12)));
        assert_eq!(args.require_text("queue").unwrap(), "Use the formula.");

        let args = parse(&["family", "--parent", "P001", "--child", "S002"], &mut config).unwrap();
        assert_eq!(args.parent.as_ref().map(ParentId::as_str), Some("P001"));
        assert_eq!(args.child.as_ref().map(StudentId::as_str), Some("S002"));
    }

    #[test]
    fn messaging_commands_name_their_missing_flags() {
        let mut config = config();
        let args = parse(&["complain", "--student", "S001"], &mut config).unwrap();
        assert!(matches!(
            args.require_teacher("complain"),
            Err(ArgsError::MissingFlag {
                flag: "--teacher",
                ..
            })
        ));
        assert!(matches!(
            args.require_text("complain"),
            Err(ArgsError::MissingFlag { flag: "--text", .. })
        ));
        assert!(matches!(
            parse(&["complaints", "--parent", " "], &mut config),
            Err(ArgsError::InvalidId { flag: "--parent", .. })
        ));
        assert!(matches!(
            parse(&["queue", "--resolve", "first"], &mut config),
            Err(ArgsError::InvalidNumber { flag: "--resolve", .. })
        ));
    }
}

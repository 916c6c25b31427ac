mod terminal;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use learn_core::model::{PracticeSettingsDraft, SessionMode, SessionResult, StudentId};
use services::{AppServices, Clock, PracticeEvent, PracticeHandle, PracticeNotice};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::terminal::TerminalBell;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStudentId { raw: String },
    InvalidLesson { raw: String },
    InvalidDuration { raw: String },
    InvalidDbUrl { raw: String },
    MissingStudent,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStudentId { raw } => write!(f, "invalid --student value: {raw:?}"),
            ArgsError::InvalidLesson { raw } => write!(f, "invalid --lesson value: {raw}"),
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingStudent => {
                write!(f, "history needs a student (--student or LEARN_STUDENT_ID)")
            }
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- practice [options]");
    eprintln!("  cargo run -p app -- history  [--db <sqlite_url>] [--student <id>]");
    eprintln!();
    eprintln!("Practice options:");
    eprintln!("  --category <name>     Lesson category (default: beginner)");
    eprintln!("  --lesson <n>          Lesson index within the category (default: 0)");
    eprintln!("  --duration <secs>     Countdown length, 1..=600 (default: 60)");
    eprintln!("  --unbounded           Finish only by completing the text");
    eprintln!("  --mute                Disable keystroke sounds");
    eprintln!("  --cap-overtype        Drop input typed past the end of the lesson");
    eprintln!("  --resync-timer        Derive the countdown from the wall clock");
    eprintln!("  --student <id>        Save results for this student");
    eprintln!("  --db <sqlite_url>     Local history database (default: sqlite:dev.sqlite3)");
    eprintln!();
    eprintln!("While practicing, each line you enter replaces the input box. Commands:");
    eprintln!("  :restart  :next  :prev  :shuffle  :lesson <category> <n>");
    eprintln!("  :time <secs>  :words  :sound on|off  :retry  :quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_STUDENT_ID, LEARN_API_BASE_URL, LEARN_API_TOKEN, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Practice,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "practice" => Some(Self::Practice),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    student_id: Option<StudentId>,
    practice: PracticeSettingsDraft,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LEARN_DB_URL")
            .ok()
            .map_or_else(
                || normalize_sqlite_url("sqlite:dev.sqlite3".into()),
                normalize_sqlite_url,
            );
        let mut student_id = std::env::var("LEARN_STUDENT_ID")
            .ok()
            .and_then(|raw| StudentId::new(raw).ok());
        let mut practice = PracticeSettingsDraft::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--student" => {
                    let value = require_value(args, "--student")?;
                    student_id = Some(
                        StudentId::new(value.clone())
                            .map_err(|_| ArgsError::InvalidStudentId { raw: value })?,
                    );
                }
                "--category" => {
                    practice.category = Some(require_value(args, "--category")?);
                }
                "--lesson" => {
                    let value = require_value(args, "--lesson")?;
                    practice.lesson_index = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLesson { raw: value.clone() })?;
                }
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    practice.duration_secs = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidDuration { raw: value.clone() })?,
                    );
                }
                "--unbounded" => practice.duration_secs = None,
                "--mute" => practice.sound_enabled = false,
                "--cap-overtype" => practice.cap_overtype = true,
                "--resync-timer" => practice.resync_timer = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            student_id,
            practice,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url.starts_with("sqlite::memory:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// One line typed at the practice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptLine {
    Event(PracticeEvent),
    Retry,
    Quit,
    Unknown(String),
}

fn parse_prompt_line(line: &str) -> PromptLine {
    let Some(command) = line.strip_prefix(':') else {
        return PromptLine::Event(PracticeEvent::Input(line.to_string()));
    };
    let mut words = command.split_whitespace();
    let event = match (words.next(), words.next(), words.next()) {
        (Some("restart"), None, None) => PracticeEvent::Restart,
        (Some("next"), None, None) => PracticeEvent::NextLesson,
        (Some("prev"), None, None) => PracticeEvent::PreviousLesson,
        (Some("shuffle"), None, None) => PracticeEvent::ShuffleLesson,
        (Some("words"), None, None) => PracticeEvent::SetMode(SessionMode::Unbounded),
        (Some("sound"), Some("on"), None) => PracticeEvent::SetSound(true),
        (Some("sound"), Some("off"), None) => PracticeEvent::SetSound(false),
        (Some("retry"), None, None) => return PromptLine::Retry,
        (Some("quit" | "q"), None, None) => return PromptLine::Quit,
        (Some("time"), Some(secs), None) => match secs.parse::<u32>() {
            Ok(secs) if (1..=learn_core::model::settings::MAX_DURATION_SECS).contains(&secs) => {
                PracticeEvent::SetMode(SessionMode::time_boxed(secs))
            }
            _ => return PromptLine::Unknown(line.to_string()),
        },
        (Some("lesson"), Some(category), Some(index)) => match index.parse::<usize>() {
            Ok(index) => PracticeEvent::SelectLesson {
                category: category.to_string(),
                index,
            },
            Err(_) => return PromptLine::Unknown(line.to_string()),
        },
        _ => return PromptLine::Unknown(line.to_string()),
    };
    PromptLine::Event(event)
}

async fn print_notices(
    mut notices: UnboundedReceiver<PracticeNotice>,
    failed: Arc<Mutex<Option<SessionResult>>>,
) {
    let mut shown_epoch = None;
    while let Some(notice) = notices.recv().await {
        match notice {
            PracticeNotice::Updated(snapshot) => {
                if shown_epoch != Some(snapshot.epoch) {
                    shown_epoch = Some(snapshot.epoch);
                    println!(
                        "\n{} / {} ({})",
                        snapshot.category,
                        snapshot.lesson.title,
                        snapshot.mode.label()
                    );
                }
                println!("{}", terminal::render_lesson(&snapshot));
                println!("{}", terminal::render_status(&snapshot));
            }
            PracticeNotice::Finished(result) => {
                println!("{}", terminal::render_result(&result));
                println!("Type :restart, :next or :shuffle to go again.");
            }
            PracticeNotice::Submitted { .. } => println!("Result saved."),
            PracticeNotice::SubmissionFailed { result, error } => {
                println!("Could not save the result ({error}). Type :retry to try again.");
                *failed.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
            }
        }
    }
}

async fn read_prompt(handle: PracticeHandle, failed: Arc<Mutex<Option<SessionResult>>>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read stdin");
                break;
            }
        };
        match parse_prompt_line(&line) {
            PromptLine::Event(event) => {
                if !handle.send(event) {
                    break;
                }
            }
            PromptLine::Retry => {
                let pending = failed.lock().unwrap_or_else(PoisonError::into_inner).take();
                match pending {
                    Some(result) => {
                        handle.send(PracticeEvent::Resubmit(result));
                    }
                    None => println!("Nothing to retry."),
                }
            }
            PromptLine::Quit => break,
            PromptLine::Unknown(raw) => println!("Unknown command: {raw}"),
        }
    }
    handle.shutdown();
}

async fn practice(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    prepare_sqlite_file(&args.db_url)?;
    let settings = args.practice.validate()?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::system()).await?;
    if args.student_id.is_none() {
        println!("No student set; results will not be saved.");
    }

    let (practice, handle, notices) =
        services.practice_loop(settings, Arc::new(TerminalBell), args.student_id);
    let failed = Arc::new(Mutex::new(None));

    let printer = tokio::spawn(print_notices(notices, Arc::clone(&failed)));
    let practice = tokio::spawn(practice.run());
    read_prompt(handle, failed).await;

    practice.await?;
    // Wait for in-flight submissions, which hold the last notice senders.
    printer.await?;
    Ok(())
}

async fn history(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let student_id = args.student_id.ok_or(ArgsError::MissingStudent)?;
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::system()).await?;
    let page = services.history_service().load(&student_id).await?;
    info!(student = %student_id, entries = page.entries.len(), "history loaded");
    print!("{}", terminal::render_history(&page));
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Practicing is the default when no subcommand is given.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Practice,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Practice,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    match cmd {
        Command::Practice => practice(parsed).await,
        Command::History => history(parsed).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|arg| (*arg).to_string()))
    }

    #[test]
    fn practice_flags_fill_the_draft() {
        let args = parse(&[
            "--category",
            "programming",
            "--lesson",
            "2",
            "--duration",
            "30",
            "--mute",
            "--student",
            "stu-1",
            "--db",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.student_id.unwrap().as_str(), "stu-1");
        let settings = args.practice.validate().unwrap();
        assert_eq!(settings.category(), "programming");
        assert_eq!(settings.lesson_index(), 2);
        assert_eq!(settings.mode(), SessionMode::time_boxed(30));
        assert!(!settings.sound_enabled());
    }

    #[test]
    fn unbounded_flag_clears_the_duration() {
        let args = parse(&["--unbounded"]).unwrap();
        assert_eq!(args.practice.duration_secs, None);
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            parse(&["--duration", "soon"]),
            Err(ArgsError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse(&["--lesson"]),
            Err(ArgsError::MissingValue { flag: "--lesson" })
        ));
        assert!(matches!(parse(&["--fast"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn prompt_lines_map_to_events() {
        assert_eq!(
            parse_prompt_line("the cat"),
            PromptLine::Event(PracticeEvent::Input("the cat".into()))
        );
        assert_eq!(
            parse_prompt_line(":sound off"),
            PromptLine::Event(PracticeEvent::SetSound(false))
        );
        assert_eq!(
            parse_prompt_line(":lesson advanced 1"),
            PromptLine::Event(PracticeEvent::SelectLesson {
                category: "advanced".into(),
                index: 1
            })
        );
        assert_eq!(
            parse_prompt_line(":time 15"),
            PromptLine::Event(PracticeEvent::SetMode(SessionMode::time_boxed(15)))
        );
        assert_eq!(parse_prompt_line(":retry"), PromptLine::Retry);
        assert!(matches!(parse_prompt_line(":time 0"), PromptLine::Unknown(_)));
        assert!(matches!(parse_prompt_line(":dance"), PromptLine::Unknown(_)));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/dev.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/dev.sqlite3"));
    }
}

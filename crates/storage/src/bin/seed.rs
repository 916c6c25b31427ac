use std::fmt;

use chrono::{DateTime, Duration, Utc};
use learn_core::model::lesson::{categories, lessons};
use learn_core::model::{SessionMode, SessionResult, StudentId};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    student_id: StudentId,
    results: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStudentId { raw: String },
    InvalidResults { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStudentId { raw } => write!(f, "invalid --student value: {raw:?}"),
            ArgsError::InvalidResults { raw } => write!(f, "invalid --results value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LEARN_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let raw_student = std::env::var("LEARN_STUDENT_ID").unwrap_or_else(|_| "local".into());
        let mut student_id = StudentId::new(raw_student.clone())
            .map_err(|_| ArgsError::InvalidStudentId { raw: raw_student })?;
        let mut results = std::env::var("LEARN_RESULTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(8);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--student" => {
                    let value = require_value(&mut args, "--student")?;
                    student_id = StudentId::new(value.clone())
                        .map_err(|_| ArgsError::InvalidStudentId { raw: value })?;
                }
                "--results" => {
                    let value = require_value(&mut args, "--results")?;
                    results = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidResults { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
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
            results,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --student <id>            Student the results belong to (default: local)");
    eprintln!("  --results <n>             Number of typing results to append (default: 8)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LEARN_DB_URL, LEARN_STUDENT_ID, LEARN_RESULTS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let catalog: Vec<_> = categories().flat_map(lessons).collect();
    let durations = [15_u32, 30, 60];
    for i in 0..args.results {
        let idx = i as usize;
        let lesson = catalog[idx % catalog.len()];
        let mode = if i % 4 == 3 {
            SessionMode::Unbounded
        } else {
            SessionMode::time_boxed(durations[idx % durations.len()])
        };
        let completed_at = now - Duration::days(i64::from(i)) - Duration::minutes(15);
        let result = SessionResult::from_persisted(
            lesson.id,
            lesson.title,
            mode,
            30 + (i * 7) % 40,
            85 + (i * 3) % 15,
            (i * 5) % 9,
            mode.duration_secs().unwrap_or(45),
            completed_at,
        )?;

        let _ = storage
            .results
            .append_result(&args.student_id, &result)
            .await?;
    }

    println!(
        "Seeded {} typing results for student {} into {}",
        args.results, args.student_id, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

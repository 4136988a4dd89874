use std::fmt;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use assessment_core::model::{CategoryCatalog, UserId};
use services::{AssessmentService, SessionConfig};
use storage::repository::Storage;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

#[derive(Debug)]
struct Args {
    db_url: String,
    user_id: UserId,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--user-id <id>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://assessment.sqlite3");
    eprintln!("  --user-id 1");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ASSESS_DB_URL, ASSESS_USER_ID, ASSESS_AUTOSAVE_MS, RUST_LOG");
    eprintln!();
    eprintln!("Seed questions first with: cargo run -p storage --bin seed");
}

fn parse_user_id(raw: &str) -> Result<UserId, ArgsError> {
    raw.trim()
        .parse::<u64>()
        .map(UserId::new)
        .map_err(|_| ArgsError::InvalidUserId {
            raw: raw.to_string(),
        })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ASSESS_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://assessment.sqlite3".into(), normalize_sqlite_url);
        let mut user_id = match std::env::var("ASSESS_USER_ID") {
            Ok(raw) => parse_user_id(&raw)?,
            Err(_) => UserId::new(1),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user-id" => {
                    let value = require_value(args, "--user-id")?;
                    user_id = parse_user_id(&value)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, user_id })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// `SQLite` will not create a missing file from a plain URL, so touch it.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
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

fn init_tracing() {
    // stdout belongs to the questionnaire; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url, args.user_id).await?;
    info!(db = %args.db_url, user = args.user_id.value(), "storage ready");

    let service = AssessmentService::from_storage(CategoryCatalog::standard(), &storage)
        .with_config(SessionConfig::from_env());
    let mut session = service.start_session().await?;

    terminal::drive(&mut session, BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&["--db", "sqlite://other.db", "--user-id", "42"]).unwrap();
        assert_eq!(args.db_url, "sqlite://other.db");
        assert_eq!(args.user_id, UserId::new(42));
    }

    #[test]
    fn bad_flags_are_reported() {
        assert!(matches!(
            parse(&["--user-id", "abc"]),
            Err(ArgsError::InvalidUserId { .. })
        ));
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(parse(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/a.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/a.db"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}

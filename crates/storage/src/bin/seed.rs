use std::collections::BTreeMap;
use std::fmt;

use assessment_core::model::{CategoryCatalog, CategoryKey, Question, UserId};
use storage::sqlite::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    questions_path: Option<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ASSESS_DB_URL")
            .unwrap_or_else(|_| "sqlite://assessment.sqlite3?mode=rwc".into());
        let mut questions_path = std::env::var("ASSESS_QUESTIONS").ok();

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
                "--questions" => {
                    questions_path = Some(require_value(&mut args, "--questions")?);
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
            questions_path,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://assessment.sqlite3?mode=rwc)");
    eprintln!("  --questions <file.json>   Object of category key -> [{{\"id\", \"question\"}}]");
    eprintln!("                            (default: a short sample set per category)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ASSESS_DB_URL, ASSESS_QUESTIONS");
}

fn sample_questions(catalog: &CategoryCatalog) -> BTreeMap<CategoryKey, Vec<Question>> {
    let samples: [&[&str]; 3] = [
        &[
            "I enjoy solving number puzzles.",
            "I can picture places clearly in my mind.",
            "I learn best by doing things with my hands.",
            "I often notice patterns in music.",
        ],
        &[
            "I prefer to plan before I act.",
            "I stay calm when plans change suddenly.",
            "I enjoy persuading other people.",
        ],
        &[
            "Recognition for my work matters to me.",
            "I like having clear goals at work.",
            "I value working with a close team.",
            "Learning new skills keeps me engaged.",
        ],
    ];

    catalog
        .iter()
        .zip(samples)
        .map(|(category, prompts)| {
            let questions = prompts
                .iter()
                .enumerate()
                .map(|(i, prompt)| Question::new((i + 1).to_string(), *prompt))
                .collect();
            (category.key().clone(), questions)
        })
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = CategoryCatalog::standard();
    let sets: BTreeMap<CategoryKey, Vec<Question>> = match &args.questions_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        }
        None => sample_questions(&catalog),
    };

    // Question sets are shared by every user; the user id only scopes progress.
    let repo = SqliteRepository::connect(&args.db_url, UserId::new(0)).await?;
    repo.migrate().await?;

    for (key, questions) in &sets {
        if catalog.position(key).is_none() {
            eprintln!("skipping unknown category {key}");
            continue;
        }
        repo.replace_questions(key, questions).await?;
        println!("Seeded {} questions for {key}", questions.len());
    }

    println!("Seed complete: {}", args.db_url);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

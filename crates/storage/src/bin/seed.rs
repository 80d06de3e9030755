use std::fmt;

use exam_core::model::TestType;
use storage::repository::Storage;
use storage::seed::seed_samples;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    test_type: Option<TestType>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTestType { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTestType { raw } => {
                write!(f, "invalid --test-type value (technician|general|extra): {raw}")
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
            std::env::var("EXAM_DB_URL").unwrap_or_else(|_| "sqlite:exam.sqlite3".into());
        let mut test_type = None;

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
                "--test-type" => {
                    let value = require_value(&mut args, "--test-type")?;
                    let parsed = value
                        .parse::<TestType>()
                        .map_err(|_| ArgsError::InvalidTestType { raw: value.clone() })?;
                    test_type = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, test_type })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:exam.sqlite3)");
    eprintln!("  --test-type <pool>        Only seed one pool (technician|general|extra)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL");
}

/// Ask sqlx to create the database file when the URL names one.
fn create_if_missing(db_url: &str) -> String {
    if db_url.contains(":memory:") || db_url.contains('?') {
        db_url.to_owned()
    } else {
        format!("{db_url}?mode=rwc")
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&create_if_missing(&args.db_url)).await?;

    let pools: Vec<TestType> = match args.test_type {
        Some(tt) => vec![tt],
        None => TestType::ALL.to_vec(),
    };

    for (test_type, count) in seed_samples(&storage, &pools).await? {
        println!("seeded {count} {test_type} questions");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

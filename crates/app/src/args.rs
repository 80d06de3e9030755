use std::fmt;

use exam_core::model::{TestType, UserId};
use exam_core::quiz::DEFAULT_PASSING_THRESHOLD;

pub const DEFAULT_DB_URL: &str = "sqlite:exam.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidTestType { raw: String },
    InvalidUser { raw: String },
    InvalidThreshold { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTestType { raw } => {
                write!(f, "invalid --test-type value (technician|general|extra): {raw}")
            }
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value (uuid): {raw}"),
            ArgsError::InvalidThreshold { raw } => {
                write!(f, "invalid --threshold value (0.0..=1.0): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Review,
    Quiz,
    Progress,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "review" => Some(Self::Review),
            "quiz" => Some(Self::Quiz),
            "progress" => Some(Self::Progress),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub test_type: TestType,
    /// `None` when no id was given; the caller generates one.
    pub user: Option<UserId>,
    pub streak: bool,
    pub threshold: f64,
    pub subelement: Option<String>,
    pub json: bool,
}

/// Parse outcome: either arguments to run with, or a request for help.
#[derive(Debug)]
pub enum Parsed {
    Run(Args),
    Help,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_test_type(raw: String) -> Result<TestType, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidTestType { raw })
}

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidUser { raw })
}

/// Environment lookups used as flag defaults.
pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Args {
    /// Parse `argv` (without the program name).
    ///
    /// The first non-flag argument picks the subcommand; `review` is the
    /// default.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown commands, flags or invalid values.
    pub fn parse(argv: Vec<String>, env: &impl Env) -> Result<Parsed, ArgsError> {
        let mut iter = argv.into_iter().peekable();

        let command = match iter.peek().map(String::as_str) {
            None => Command::Review,
            Some(first) if first.starts_with('-') => Command::Review,
            Some(first) => {
                let command = Command::from_arg(first)
                    .ok_or_else(|| ArgsError::UnknownCommand(first.to_owned()))?;
                iter.next();
                command
            }
        };

        let mut db_url =
            normalize_sqlite_url(env.var("EXAM_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into()));
        let mut test_type = match env.var("EXAM_TEST_TYPE") {
            Some(raw) => parse_test_type(raw)?,
            None => TestType::default(),
        };
        let mut user = env.var("EXAM_USER_ID").map(parse_user).transpose()?;
        let mut streak = false;
        let mut threshold = DEFAULT_PASSING_THRESHOLD;
        let mut subelement = None;
        let mut json = false;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--test-type" => {
                    test_type = parse_test_type(require_value(&mut iter, "--test-type")?)?;
                }
                "--user" => {
                    user = Some(parse_user(require_value(&mut iter, "--user")?)?);
                }
                "--streak" => streak = true,
                "--threshold" => {
                    let value = require_value(&mut iter, "--threshold")?;
                    threshold = value
                        .parse::<f64>()
                        .ok()
                        .filter(|t| (0.0..=1.0).contains(t))
                        .ok_or(ArgsError::InvalidThreshold { raw: value })?;
                }
                "--subelement" => {
                    subelement = Some(require_value(&mut iter, "--subelement")?);
                }
                "--json" => json = true,
                "--help" | "-h" => return Ok(Parsed::Help),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Parsed::Run(Self {
            command,
            db_url,
            test_type,
            user,
            streak,
            threshold,
            subelement,
            json,
        }))
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [review] [options]   # weak-question review (default)");
    eprintln!("  cargo run -p app -- quiz     [options]   # topic quiz");
    eprintln!("  cargo run -p app -- progress [options]   # attempt summary");
    eprintln!("  cargo run -p app -- seed     [options]   # load sample questions");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>       SQLite URL (default: sqlite:exam.sqlite3)");
    eprintln!("  --test-type <class>     technician|general|extra (default: technician)");
    eprintln!("  --user <uuid>           Learner id (generated when absent)");
    eprintln!("  --streak                Require 3 correct in a row to clear (review)");
    eprintln!("  --threshold <0..1>      Quiz passing threshold (default: 0.8)");
    eprintln!("  --subelement <code>     Limit the quiz to one subelement, e.g. T5");
    eprintln!("  --json                  Machine-readable output (progress)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_TEST_TYPE, EXAM_USER_ID, RUST_LOG");
}

pub fn normalize_sqlite_url(raw: String) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeEnv(HashMap<&'static str, String>);

    impl Env for FakeEnv {
        fn var(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    fn no_env() -> FakeEnv {
        FakeEnv(HashMap::new())
    }

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn run_args(parsed: Parsed) -> Args {
        match parsed {
            Parsed::Run(args) => args,
            Parsed::Help => panic!("expected run args"),
        }
    }

    #[test]
    fn defaults_to_review_with_technician_pool() {
        let args = run_args(Args::parse(Vec::new(), &no_env()).unwrap());
        assert_eq!(args.command, Command::Review);
        assert_eq!(args.test_type, TestType::Technician);
        assert!((args.threshold - 0.8).abs() < f64::EPSILON);
        assert!(args.db_url.starts_with("sqlite://"));
        assert!(args.db_url.ends_with("exam.sqlite3"));
        assert!(args.user.is_none());
    }

    #[test]
    fn flags_override_environment() {
        let env = FakeEnv(HashMap::from([
            ("EXAM_TEST_TYPE", "general".to_string()),
            ("EXAM_DB_URL", "sqlite::memory:".to_string()),
        ]));
        let args = run_args(
            Args::parse(
                argv(&["quiz", "--test-type", "extra", "--subelement", "E5", "--threshold", "0.7"]),
                &env,
            )
            .unwrap(),
        );
        assert_eq!(args.command, Command::Quiz);
        assert_eq!(args.test_type, TestType::Extra);
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.subelement.as_deref(), Some("E5"));
        assert!((args.threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn environment_supplies_user() {
        let user = UserId::generate();
        let env = FakeEnv(HashMap::from([("EXAM_USER_ID", user.to_string())]));
        let args = run_args(Args::parse(argv(&["progress", "--json"]), &env).unwrap());
        assert_eq!(args.user, Some(user));
        assert!(args.json);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Args::parse(argv(&["quiz", "--threshold", "1.2"]), &no_env()),
            Err(ArgsError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["--user", "nope"]), &no_env()),
            Err(ArgsError::InvalidUser { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["drill"]), &no_env()),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(matches!(
            Args::parse(argv(&["review", "--db"]), &no_env()),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
    }

    #[test]
    fn default_db_url_is_accepted_by_file_preparation() {
        let args = run_args(Args::parse(argv(&["seed"]), &no_env()).unwrap());
        let path = args.db_url.strip_prefix("sqlite://").unwrap();
        assert!(std::path::Path::new(path).is_absolute());
        assert!(path.ends_with("exam.sqlite3"));

        let relative = FakeEnv(HashMap::from([("EXAM_DB_URL", "data/exam.db".to_string())]));
        let args = run_args(Args::parse(Vec::new(), &relative).unwrap());
        assert!(args.db_url.starts_with("sqlite://"));
        assert!(args.db_url.ends_with("data/exam.db"));
    }

    #[test]
    fn help_short_circuits() {
        assert!(matches!(
            Args::parse(argv(&["seed", "--help"]), &no_env()),
            Ok(Parsed::Help)
        ));
    }

    #[test]
    fn normalizes_relative_sqlite_paths() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/exam.db".into()),
            "sqlite:///tmp/exam.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/exam.db".into()),
            "sqlite:///var/exam.db"
        );
    }
}

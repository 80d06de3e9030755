mod args;
mod progress;
mod quiz;
mod review;
mod terminal;

use std::io;

use log::info;

use exam_core::model::{TestType, UserId};
use services::{AppServices, Clock};
use storage::seed::seed_samples;

use args::{Args, ArgsError, Command, Parsed, ProcessEnv, print_usage};
use progress::ProgressReport;
use terminal::Terminal;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1).collect(), &ProcessEnv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let args = match parsed {
        Parsed::Run(args) => args,
        Parsed::Help => {
            print_usage();
            return Ok(());
        }
    };

    let user = args.user.unwrap_or_else(|| {
        let user = UserId::generate();
        eprintln!("no --user given; using {user} (set EXAM_USER_ID to keep progress)");
        user
    });

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let app = AppServices::new_sqlite(&args.db_url, Clock::system(), user).await?;
    info!("opened {} as {user}", args.db_url);

    let stdin = io::stdin();
    let mut term = Terminal::new(stdin.lock(), io::stdout());

    match args.command {
        Command::Review => {
            let summary = review::run_review(&app, args.test_type, args.streak, &mut term).await?;
            println!(
                "answered {}, cleared {}",
                summary.answered, summary.cleared
            );
            if summary.failed_writes > 0 {
                eprintln!("{} answers could not be saved", summary.failed_writes);
            }
        }
        Command::Quiz => {
            let verdict = quiz::run_quiz(
                &app,
                args.test_type,
                args.subelement.as_deref(),
                args.threshold,
                &mut term,
            )
            .await?;
            if let Some((passed, score, total)) = verdict {
                info!("quiz finished: {score}/{total} passed={passed}");
            }
        }
        Command::Progress => {
            let report = ProgressReport::load(&app, args.test_type).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text());
            }
        }
        Command::Seed => {
            for (test_type, count) in seed_samples(app.storage(), &TestType::ALL).await? {
                println!("seeded {count} {test_type} questions");
            }
        }
    }
    Ok(())
}

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

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use args::normalize_sqlite_url;

    #[test]
    fn prepares_files_for_normalized_urls() {
        let dir = std::env::temp_dir().join(format!("exam-prepare-{}", UserId::generate()));
        let file = dir.join("exam.sqlite3");
        let url = normalize_sqlite_url(format!("sqlite:{}", file.display()));

        prepare_sqlite_file(&url).unwrap();
        assert!(file.exists());
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
        assert!(prepare_sqlite_file("sqlite:exam.sqlite3").is_err());
    }
}

mod args;
mod terminal;

use std::io;

use services::{AppConfig, AppServices, Clock};
use tracing_subscriber::EnvFilter;

use args::{Args, ArgsError, Command, Env, prepare_sqlite_file, print_usage};
use terminal::{Terminal, accuracy_line, choose_user, run_quiz, unlock};

const DEFAULT_LOG_FILTER: &str = "warn,services=info,storage=info";

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    // Logs go to stderr so they never interleave with quiz prompts on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), &Env::from_process()).map_err(
        |e: ArgsError| {
            eprintln!("{e}");
            print_usage();
            e
        },
    )?;
    if parsed.command == Command::Help {
        print_usage();
        return Ok(());
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::system(),
        AppConfig {
            questions_dir: parsed.questions_dir.clone(),
            seed: parsed.seed,
        },
    )
    .await?;

    let stdin = io::stdin();
    let mut term = Terminal::new(stdin.lock(), io::stdout());
    let preset = std::env::var("QUIZ_PASSWORD").ok();
    unlock(&mut term, app.auth().as_ref(), preset)?;

    tracing::debug!(command = ?parsed.command, db = %parsed.db_url, "dispatching");
    match parsed.command {
        Command::Users => {
            for name in app.users().list_users().await? {
                term.say(name)?;
            }
        }
        Command::AddUser { name } => {
            let id = app.users().register(&name).await?;
            term.say(format_args!("registered {} (id {id})", name.trim()))?;
        }
        Command::Files => {
            for file in app.question_bank().available_files()? {
                term.say(file)?;
            }
        }
        Command::Stats => match parsed.user {
            Some(name) => {
                let accuracy = app.stats().per_user_by_name(&name).await?;
                term.say(format_args!("{}: {}", name.trim(), accuracy_line(accuracy)))?;
            }
            None => {
                let summary = app.stats().global_summary().await?;
                if summary.is_empty() {
                    term.say("No responses yet.")?;
                }
                for (name, score) in summary {
                    term.say(format_args!(
                        "{name}: {} / {} ({:.1}%)",
                        score.correct,
                        score.total,
                        score.percentage().unwrap_or_default()
                    ))?;
                }
            }
        },
        Command::Trend => {
            for ((day, name), point) in app.stats().trend().await? {
                term.say(format_args!(
                    "{day}  {name}  {:.1}%  ({} answers)",
                    point.accuracy_pct, point.samples
                ))?;
            }
        }
        Command::Quiz => {
            let Some((name, user_id)) = choose_user(&mut term, &app, parsed.user).await? else {
                return Ok(());
            };
            let files = match parsed.files {
                Some(files) if !files.is_empty() => files,
                _ => app.question_bank().available_files()?,
            };
            term.say(format_args!(
                "{name}: {} file(s), {} order",
                files.len(),
                parsed.mode
            ))?;
            run_quiz(&mut term, &app, user_id, &files, parsed.mode).await?;
        }
        Command::Help => print_usage(),
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

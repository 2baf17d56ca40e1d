use std::fmt;
use std::path::PathBuf;

use services::LoadMode;

pub const DEFAULT_DB_URL: &str = "sqlite://users.db";
pub const DEFAULT_QUESTIONS_DIR: &str = "questions";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingUserName,
    InvalidDbUrl { raw: String },
    InvalidMode { raw: String },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingUserName => write!(f, "add-user requires a name"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (expected random or ordered)")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
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

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [quiz]            [options]   # take a test (default)");
    eprintln!("  quiz users             [options]   # list registered users");
    eprintln!("  quiz add-user <name>   [options]   # register a user");
    eprintln!("  quiz files             [options]   # list question files");
    eprintln!("  quiz stats             [options]   # accuracy per user");
    eprintln!("  quiz trend             [options]   # daily accuracy per user");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>        default {DEFAULT_DB_URL}");
    eprintln!("  --questions-dir <dir>    default {DEFAULT_QUESTIONS_DIR}");
    eprintln!("  --user <name>            user taking the test (stats: only this user)");
    eprintln!("  --files a.json,b.json    question files (default: all)");
    eprintln!("  --mode random|ordered    question order (default: random)");
    eprintln!("  --seed <u64>             reproducible random order");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_QUESTIONS_DIR, QUIZ_MASTER_PASSWORD, QUIZ_PASSWORD, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quiz,
    Users,
    AddUser { name: String },
    Files,
    Stats,
    Trend,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub questions_dir: PathBuf,
    pub user: Option<String>,
    pub files: Option<Vec<String>>,
    pub mode: LoadMode,
    pub seed: Option<u64>,
}

/// Environment defaults, passed in so parsing stays testable.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub db_url: Option<String>,
    pub questions_dir: Option<String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL").ok().filter(|v| !v.trim().is_empty()),
            questions_dir: std::env::var("QUIZ_QUESTIONS_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

impl Args {
    pub fn parse(argv: impl IntoIterator<Item = String>, env: &Env) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter().peekable();

        let mut command = match args.peek().map(String::as_str) {
            None => Command::Quiz,
            Some(first) if first.starts_with('-') => Command::Quiz,
            Some(_) => {
                let first = args.next().unwrap_or_default();
                match first.as_str() {
                    "quiz" => Command::Quiz,
                    "users" => Command::Users,
                    "add-user" => Command::AddUser {
                        name: String::new(),
                    },
                    "files" => Command::Files,
                    "stats" => Command::Stats,
                    "trend" => Command::Trend,
                    "help" => Command::Help,
                    _ => return Err(ArgsError::UnknownCommand(first)),
                }
            }
        };

        let mut db_url = normalize_sqlite_url(
            env.db_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DB_URL.to_owned()),
        );
        let mut questions_dir = PathBuf::from(
            env.questions_dir
                .clone()
                .unwrap_or_else(|| DEFAULT_QUESTIONS_DIR.to_owned()),
        );
        let mut user = None;
        let mut files = None;
        let mut mode = LoadMode::Random;
        let mut seed = None;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--questions-dir" => {
                    questions_dir = PathBuf::from(require_value(&mut args, "--questions-dir")?);
                }
                "--user" => user = Some(require_value(&mut args, "--user")?),
                "--files" => {
                    let value = require_value(&mut args, "--files")?;
                    let list: Vec<String> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_owned)
                        .collect();
                    files = Some(list);
                }
                "--mode" => {
                    let value = require_value(&mut args, "--mode")?;
                    mode = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--seed" => {
                    let value = require_value(&mut args, "--seed")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--help" | "-h" => command = Command::Help,
                _ if !arg.starts_with('-') => positional.push(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if let Command::AddUser { name } = &mut command {
            if positional.is_empty() {
                return Err(ArgsError::MissingUserName);
            }
            *name = positional.join(" ");
        } else if let Some(extra) = positional.into_iter().next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self {
            command,
            db_url,
            questions_dir,
            user,
            files,
            mode,
            seed,
        })
    }
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

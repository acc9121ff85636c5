//! Credentials and runtime settings for the homework watcher.
use clap::Parser;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

use crate::error::WatchError;

pub const PRACTICUM_TOKEN_VAR: &str = "P_TOKEN";
pub const TELEGRAM_TOKEN_VAR: &str = "BOT_TOKEN";
pub const TELEGRAM_CHAT_ID_VAR: &str = "T_CHAT_ID";

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("env file error: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Command line settings. Every flag has a default, so running with no
/// arguments polls the production endpoint every ten minutes.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Relay homework review status changes to Telegram")]
pub struct Settings {
    /// Seconds to sleep between polls
    #[arg(long, env = "RETRY_TIME", default_value_t = 600)]
    pub retry_secs: u64,

    /// Timeout applied to every outbound HTTP request
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Homework statuses endpoint
    #[arg(long, env = "PRACTICUM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Path to a .env file; defaults to `.env` lookup in the working directory
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Log file path
    #[arg(long, default_value = "program.log")]
    pub log_file: PathBuf,

    /// Size at which the log file is rotated
    #[arg(long, default_value_t = 50_000_000)]
    pub log_max_bytes: u64,

    /// Number of rotated log files to keep
    #[arg(long, default_value_t = 5)]
    pub log_backups: usize,

    /// Abort at startup when a credential is missing instead of polling anyway
    #[arg(long)]
    pub strict_credentials: bool,
}

impl Settings {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_secs == 0 {
            return Err(ConfigError::Invalid("retry_secs must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must be non-empty"));
        }
        if self.log_max_bytes == 0 {
            return Err(ConfigError::Invalid("log_max_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Finds `--env-file <path>` or `--env-file=<path>` ahead of the full parse,
/// so the file can be loaded before clap reads its `env` fallbacks.
pub fn env_file_from_args<I, S>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        }
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.to_str().and_then(|a| a.strip_prefix("--env-file=")) {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// Load variables from the given env file, or from `.env` when present.
/// Only one file is read. A missing default `.env` is not an error; a
/// missing explicit file is.
pub fn load_env_file(path: Option<&PathBuf>) -> Result<(), ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

/// The three secrets the watcher needs. Blank values count as missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub practicum_token: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |v: &Option<String>| if v.is_some() { "[REDACTED]" } else { "<missing>" };
        f.debug_struct("Credentials")
            .field("practicum_token", &mark(&self.practicum_token))
            .field("telegram_token", &mark(&self.telegram_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            practicum_token: read(PRACTICUM_TOKEN_VAR),
            telegram_token: read(TELEGRAM_TOKEN_VAR),
            telegram_chat_id: read(TELEGRAM_CHAT_ID_VAR),
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.practicum_token.is_none() {
            missing.push(PRACTICUM_TOKEN_VAR);
        }
        if self.telegram_token.is_none() {
            missing.push(TELEGRAM_TOKEN_VAR);
        }
        if self.telegram_chat_id.is_none() {
            missing.push(TELEGRAM_CHAT_ID_VAR);
        }
        missing
    }

    /// Returns whether all credentials are present, logging a critical
    /// diagnostic otherwise. Does not stop the caller.
    pub fn check_tokens(&self) -> bool {
        let missing = self.missing();
        if missing.is_empty() {
            return true;
        }
        error!(
            severity = "critical",
            missing = %missing.join(", "),
            "required environment variables are missing"
        );
        false
    }

    pub fn require(&self) -> Result<(), WatchError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WatchError::MissingCredentials(missing))
        }
    }

    pub fn practicum_token(&self) -> &str {
        self.practicum_token.as_deref().unwrap_or_default()
    }

    pub fn telegram_token(&self) -> &str {
        self.telegram_token.as_deref().unwrap_or_default()
    }

    pub fn telegram_chat_id(&self) -> &str {
        self.telegram_chat_id.as_deref().unwrap_or_default()
    }
}

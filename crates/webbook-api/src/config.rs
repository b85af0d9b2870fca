//! Listener configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use webbook_core::policy::{IngestPolicy, NonConformingPolicy};
use webbook_core::secret::SharedSecret;

use crate::error::AppError;

/// Default store location.
pub const DEFAULT_DB_FILE: &str = "/tmp/webbook.db";
/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "/tmp/webhook-log.txt";
/// Default GitLab secret.
pub const DEFAULT_GITLAB_SECRET: &str = "MyGitLabToken";
/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 4000;
/// Default request body limit, 25 MiB.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;
/// Default background report interval.
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 60;

/// Effective listener configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `WEBBOOKS_DB_FILE`
    pub db_file: PathBuf,
    /// `WEBBOOKS_LOGS_FILE`
    pub log_file: PathBuf,
    /// `GITLAB_SECRET`
    pub gitlab_secret: SharedSecret,
    /// `HOST`
    pub host: String,
    /// `PORT`
    pub port: u16,
    /// `WEBBOOKS_NON_CONFORMING` and `WEBBOOKS_CAPTURE_UNRECOGNIZED`
    pub policy: IngestPolicy,
    /// `WEBBOOKS_BODY_LIMIT_BYTES`
    pub body_limit: usize,
    /// `WEBBOOKS_REPORT_INTERVAL_SECS`
    pub report_interval: Duration,
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, AppError> {
    match lookup(key).map(|raw| raw.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(raw) => match raw.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(AppError::Config(format!(
                "{key} must be a boolean, got '{other}'"
            ))),
        },
    }
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset keys.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value is set but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let report_secs = parsed(
            &lookup,
            "WEBBOOKS_REPORT_INTERVAL_SECS",
            DEFAULT_REPORT_INTERVAL_SECS,
        )?;
        if report_secs == 0 {
            return Err(AppError::Config(
                "WEBBOOKS_REPORT_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        Ok(Self {
            db_file: PathBuf::from(text("WEBBOOKS_DB_FILE", DEFAULT_DB_FILE)),
            log_file: PathBuf::from(text("WEBBOOKS_LOGS_FILE", DEFAULT_LOG_FILE)),
            gitlab_secret: SharedSecret::new(&text("GITLAB_SECRET", DEFAULT_GITLAB_SECRET)),
            host: text("HOST", DEFAULT_HOST),
            port: parsed(&lookup, "PORT", DEFAULT_PORT)?,
            policy: IngestPolicy {
                non_conforming: parsed(
                    &lookup,
                    "WEBBOOKS_NON_CONFORMING",
                    NonConformingPolicy::Reject,
                )?,
                capture_unrecognized: flag(&lookup, "WEBBOOKS_CAPTURE_UNRECOGNIZED", true)?,
            },
            body_limit: parsed(&lookup, "WEBBOOKS_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
            report_interval: Duration::from_secs(report_secs),
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

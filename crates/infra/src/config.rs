//! Process configuration, loaded once at startup.

use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

use epicevents_auth::AuthConfig;
use epicevents_auth::config::DEFAULT_TOKEN_TTL_MINUTES;

pub const ENV_JWT_SECRET: &str = "EPICEVENTS_JWT_SECRET";
pub const ENV_TOKEN_TTL_MINUTES: &str = "EPICEVENTS_TOKEN_TTL_MINUTES";
pub const ENV_DATA_PATH: &str = "EPICEVENTS_DATA_PATH";
pub const ENV_TOKEN_PATH: &str = "EPICEVENTS_TOKEN_PATH";
pub const ENV_PASSWORD_COST: &str = "EPICEVENTS_PASSWORD_COST";

const DEFAULT_DATA_PATH: &str = "epicevents.json";
const DEFAULT_TOKEN_PATH: &str = ".token";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("EPICEVENTS_JWT_SECRET is not set; refusing to start without a signing secret")]
    MissingSecret,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    /// JSON record store location.
    pub data_path: PathBuf,
    /// Where the CLI keeps the session token between invocations.
    pub token_path: PathBuf,
}

impl AppConfig {
    /// Load from the process environment (with `.env` support).
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(ENV_JWT_SECRET)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let ttl_minutes = match lookup(ENV_TOKEN_TTL_MINUTES) {
            Some(raw) => parse_positive(ENV_TOKEN_TTL_MINUTES, &raw)?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let mut auth = AuthConfig::new(secret).with_token_ttl(Duration::minutes(ttl_minutes));
        if let Some(raw) = lookup(ENV_PASSWORD_COST) {
            let cost = raw.trim().parse::<u32>().ok().filter(|c| (4..=31).contains(c));
            let cost = cost.ok_or_else(|| ConfigError::Invalid {
                key: ENV_PASSWORD_COST,
                reason: format!("expected a bcrypt cost between 4 and 31, got '{raw}'"),
            })?;
            auth = auth.with_password_cost(cost);
        }

        Ok(Self {
            auth,
            data_path: lookup(ENV_DATA_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            token_path: lookup(ENV_TOKEN_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
        })
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a positive integer, got '{raw}'"),
        }),
    }
}

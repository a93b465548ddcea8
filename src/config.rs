use crate::error::ConfigError;
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:survey_tally.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_VOTE_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    // Extra attempts after a version conflict before giving up
    pub max_vote_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_vote_retries: DEFAULT_MAX_VOTE_RETRIES,
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidNumber` when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `InvalidNumber` when a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_number(&lookup, "SURVEY_DB_MAX_CONNECTIONS", defaults.max_connections, 1)?,
            max_vote_retries: parse_number(&lookup, "SURVEY_MAX_VOTE_RETRIES", defaults.max_vote_retries, 0)?,
        })
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u32,
    min: u32,
) -> Result<u32, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= min)
            .ok_or(ConfigError::InvalidNumber { key, value, min }),
    }
}

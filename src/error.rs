use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("survey not found: {0}")]
    NotFound(String),
    #[error("survey {survey_id} was modified concurrently (expected version {expected}, found {current})")]
    Conflict { survey_id: String, expected: i64, current: i64 },
    #[error("stored survey data is invalid: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command already registered: {0}")]
    Duplicate(String),
    #[error("unknown command: {0}")]
    Unknown(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be an integer of at least {min}, got {value:?}")]
    InvalidNumber { key: &'static str, value: String, min: u32 },
}

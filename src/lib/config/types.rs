use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub const LABEL_VAR: &str = "L2F_LABEL";
pub const FILENAME_FORMAT_VAR: &str = "L2F_FILENAME_FORMAT";
pub const CONTAINER_TO_RESTART_VAR: &str = "L2F_CONTAINER_TO_RESTART";
pub const END_WITH_NEWLINE_VAR: &str = "L2F_END_WITH_NEWLINE";
pub const RESTART_DEBOUNCE_VAR: &str = "L2F_RESTART_DEBOUNCE_MS";

pub const DEFAULT_FILENAME_FORMAT: &str = "{name}";
pub const DEFAULT_RESTART_DEBOUNCE: Duration = Duration::from_secs(3);

/// Process-wide settings, assembled once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Label key whose value gets mirrored; also selects the containers.
    pub label: String,
    pub filename_format: String,
    pub container_to_restart: Option<String>,
    pub end_with_newline: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub restart_debounce: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("L2F_LABEL must be set to the label to mirror")]
    MissingLabel,

    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} is not valid UTF-8")]
    NotUnicode { var: &'static str },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

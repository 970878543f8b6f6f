use std::{env::VarError, time::Duration};

use super::types::{
    CONTAINER_TO_RESTART_VAR, Config, ConfigError, ConfigResult, DEFAULT_FILENAME_FORMAT,
    DEFAULT_RESTART_DEBOUNCE, END_WITH_NEWLINE_VAR, FILENAME_FORMAT_VAR, LABEL_VAR,
    RESTART_DEBOUNCE_VAR,
};

/// `1`, `true`, `yes` and `on` (any case) are true; everything else is false.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Builds the config from an arbitrary key lookup shaped like [`std::env::var`].
    /// Empty values count as unset; values that are not UTF-8 are rejected.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let get = |var: &'static str| match lookup(var) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            Ok(_) | Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { var }),
        };

        let label = get(LABEL_VAR)?.ok_or(ConfigError::MissingLabel)?;

        let restart_debounce = match get(RESTART_DEBOUNCE_VAR)? {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: RESTART_DEBOUNCE_VAR,
                    value: raw,
                })?,
            None => DEFAULT_RESTART_DEBOUNCE,
        };

        Ok(Config {
            label,
            filename_format: get(FILENAME_FORMAT_VAR)?
                .unwrap_or_else(|| DEFAULT_FILENAME_FORMAT.to_string()),
            container_to_restart: get(CONTAINER_TO_RESTART_VAR)?,
            end_with_newline: get(END_WITH_NEWLINE_VAR)?
                .map(|raw| is_truthy(&raw))
                .unwrap_or(true),
            restart_debounce,
        })
    }
}

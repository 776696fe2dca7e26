// Log level domain type
//
// The level set is fixed; storage enforces the same set with a CHECK constraint.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Human readable list of accepted levels, in severity order.
pub const ALLOWED_LEVELS: &str = "debug, info, warn, error";

/// Severity of a log event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Trim and lowercase `raw`, then parse it.
    pub fn parse_normalized(raw: &str) -> Result<Self, LogLevelParseError> {
        raw.trim().to_lowercase().parse()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the accepted levels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("level must be one of: {ALLOWED_LEVELS}")]
pub struct LogLevelParseError;

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    /// Exact, case-sensitive match. Callers normalize (trim + lowercase) first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(LogLevelParseError),
        }
    }
}

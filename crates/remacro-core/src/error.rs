//! Structured errors returned by every control-surface operation

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad numeric input for a delay, speed or loop count
    Validation,
    /// Operation requested in a state that does not allow it
    Busy,
    /// Play requested with nothing recorded
    EmptyTimeline,
    /// Malformed or missing fields in a macro file
    Serialization,
    /// A key that cannot be mapped to an injectable key
    UnresolvedSymbol,
    InjectionFailed,
    Io,
    NotImplemented,
    Unknown,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// The engine is recording or playing and cannot take this request.
    pub fn busy(operation: &str, state: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Busy,
            format!("Cannot {} while {}", operation, state),
        )
        .with_suggestions(vec!["Stop recording or playback first.".to_string()])
    }

    pub fn empty_timeline() -> Self {
        Self::new(ErrorCode::EmptyTimeline, "There are no recorded events")
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Serialization, message)
    }

    pub fn unresolved_symbol(key: &str) -> Self {
        Self::new(
            ErrorCode::UnresolvedSymbol,
            format!("Key '{}' has no injectable mapping", key),
        )
    }

    pub fn injection_failed(action: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::InjectionFailed,
            format!("{} failed: {}", action, reason),
        )
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotImplemented, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(ErrorCode::Unknown, format!("{:#}", e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

//! Error types for the reminder bridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level error type for every reminder operation.
///
/// Errors are plain values (`Clone`) so a single helper build failure can be
/// handed to every caller waiting on that build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReminderError {
    /// Reminders access not granted, denied, or unavailable on this platform.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Named list or reminder does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input, duplicate list name, or no-op update.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Permission prompt, data fetch, or gateway call exceeded its bound.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Missing or unparseable envelope from the gateway.
    #[error("gateway protocol error: {0}")]
    Protocol(String),

    /// Compiling the gateway helper failed.
    #[error("helper build failed: {0}")]
    Build(String),

    /// Unclassified gateway failure (process crash, native store error).
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl ReminderError {
    /// Classification of this error, as carried in failure envelopes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Permission(_) => ErrorKind::Permission,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Build(_) => ErrorKind::Build,
            Self::Gateway(_) => ErrorKind::Gateway,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// The bare message, without the kind prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Self::Permission(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::Timeout(m)
            | Self::Protocol(m)
            | Self::Build(m)
            | Self::Gateway(m)
            | Self::Config(m) => m,
        }
    }

    /// Rebuild an error from a kind and message received over the wire.
    pub fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::Permission => Self::Permission(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Timeout => Self::Timeout(message),
            ErrorKind::Protocol => Self::Protocol(message),
            ErrorKind::Build => Self::Build(message),
            ErrorKind::Gateway => Self::Gateway(message),
            ErrorKind::Config => Self::Config(message),
        }
    }
}

/// Wire classification of a [`ReminderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Permission,
    NotFound,
    Validation,
    Timeout,
    Protocol,
    Build,
    Gateway,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Permission => "permission",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Build => "build",
            ErrorKind::Gateway => "gateway",
            ErrorKind::Config => "config",
        };
        f.write_str(s)
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ReminderError>;

//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 3xx: Config errors
//! - 5xx: Network / remote store errors
//! - 6xx: Local storage errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `ValidationFailed` -> E801).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file not found
    ConfigNotFound,
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Network errors (5xx)
    // ========================================
    /// E501: Cannot reach the remote document store
    NetworkUnreachable,
    /// E502: Remote call exceeded its bound
    NetworkTimeout,
    /// E503: Remote rejected the session or the access rules
    NetworkAuthFailed,
    /// E504: Remote answered with something we could not interpret
    RemoteInvalidResponse,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Failed to read from the local store
    StorageReadError,
    /// E602: Failed to write to the local store
    StorageWriteError,
    /// E604: Database operation failed
    DatabaseError,
    /// E605: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Input rejected before any I/O
    ValidationFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Unexpected internal error
    InternalError,
    /// E905: Generic not found (catch-all)
    NotFound,
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `ValidationFailed` -> 801).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::ConfigNotFound => 301,
            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            Self::NetworkUnreachable => 501,
            Self::NetworkTimeout => 502,
            Self::NetworkAuthFailed => 503,
            Self::RemoteInvalidResponse => 504,

            Self::StorageReadError => 601,
            Self::StorageWriteError => 602,
            Self::DatabaseError => 604,
            Self::SerializationError => 605,

            Self::ValidationFailed => 801,

            Self::InternalError => 901,
            Self::NotFound => 905,
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E801").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::ConfigNotFound => "Create ~/.config/hydrosync/config.toml or pass --config <path>",
            Self::ConfigInvalid => "Check TOML syntax and value ranges in the config file",
            Self::ConfigMissingRequired => "Set the missing key in config.toml or the matching HYDRO_* variable",

            Self::NetworkUnreachable => "Check your network connection; data is kept locally until the remote is back",
            Self::NetworkTimeout => "The remote store is slow; local data is unaffected",
            Self::NetworkAuthFailed => "Sign in again or check the remote access rules for this user",
            Self::RemoteInvalidResponse => "The remote store returned an unexpected document shape",

            Self::StorageReadError => "Check permissions on the data directory",
            Self::StorageWriteError => "Check disk space and write permissions on the data directory",
            Self::DatabaseError => "The local database may be corrupted; move it aside to start fresh",
            Self::SerializationError => "The stored snapshot could not be decoded",

            Self::ValidationFailed => "Amounts and goals must be positive whole milliliters",

            Self::InternalError => "This is a bug; please report it with the -vv log output",
            Self::NotFound => "Check the identifier and try again",
            Self::IoError => "Check file permissions and paths",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::DatabaseError | Self::SerializationError | Self::InternalError
        )
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            3 => "config",
            5 => "network",
            6 => "storage",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::ConfigNotFound,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::NetworkUnreachable,
            Self::NetworkTimeout,
            Self::NetworkAuthFailed,
            Self::RemoteInvalidResponse,
            Self::StorageReadError,
            Self::StorageWriteError,
            Self::DatabaseError,
            Self::SerializationError,
            Self::ValidationFailed,
            Self::InternalError,
            Self::NotFound,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}

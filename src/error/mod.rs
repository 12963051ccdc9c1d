//! Error handling for hydrosync.
//!
//! This module provides:
//! - [`HydroError`]: The main error enum for all hydrosync operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type for robot-mode output
//!
//! Remote-store failures have their own taxonomy in
//! [`crate::remote::RemoteError`]; the sync engine swallows them, so they
//! only surface through `HydroError` from the adapter-level APIs.

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::remote::{RemoteError, RemoteErrorKind};

pub use codes::ErrorCode;

/// Main error type for hydrosync operations.
#[derive(Error, Debug)]
pub enum HydroError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HydroError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Http(_) => ErrorCode::NetworkUnreachable,
            Self::Remote(err) => match err.kind {
                RemoteErrorKind::Unavailable => ErrorCode::NetworkUnreachable,
                RemoteErrorKind::Timeout => ErrorCode::NetworkTimeout,
                RemoteErrorKind::PermissionDenied | RemoteErrorKind::Unauthenticated => {
                    ErrorCode::NetworkAuthFailed
                }
                RemoteErrorKind::NotFound => ErrorCode::NotFound,
                RemoteErrorKind::FailedPrecondition
                | RemoteErrorKind::InvalidResponse
                | RemoteErrorKind::Other => ErrorCode::RemoteInvalidResponse,
            },
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::Storage(_) => ErrorCode::StorageWriteError,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            Self::Remote(err) => Some(serde_json::json!({ "remote_kind": err.kind.as_str() })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_hydro_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "VALIDATION_FAILED")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 801)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "config", "network")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_hydro_error(err: &HydroError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&HydroError> for StructuredError {
    fn from(err: &HydroError) -> Self {
        Self::from_hydro_error(err)
    }
}

/// Result type alias using HydroError.
pub type Result<T> = std::result::Result<T, HydroError>;

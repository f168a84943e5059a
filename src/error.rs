//! Error types for YouSoul.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - HTTP status mapping for the API surface
//! - Category-based exit codes for the CLI (2=db, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for API bodies and piped CLI consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for YouSoul operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string, an HTTP status and a
/// category-based exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    TaskNotFound,
    RouteNotFound,

    // Validation (exit 4)
    InvalidStatus,
    InvalidPriority,
    InvalidMood,
    InvalidArgument,
    RequiredField,

    // Auth (exit 5)
    Unauthenticated,

    // Upstream API (exit 6)
    ApiError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
    HttpError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidPriority => "INVALID_PRIORITY",
            Self::InvalidMood => "INVALID_MOOD",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::ApiError => "API_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::TaskNotFound | Self::RouteNotFound => 3,
            Self::InvalidStatus
            | Self::InvalidPriority
            | Self::InvalidMood
            | Self::InvalidArgument
            | Self::RequiredField => 4,
            Self::Unauthenticated => 5,
            Self::ApiError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::HttpError => 8,
        }
    }

    /// HTTP status code used when this error crosses the API boundary.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::TaskNotFound | Self::RouteNotFound => 404,
            Self::InvalidStatus
            | Self::InvalidPriority
            | Self::InvalidMood
            | Self::InvalidArgument
            | Self::RequiredField
            | Self::JsonError => 400,
            Self::Unauthenticated => 401,
            Self::ApiError | Self::HttpError => 502,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::DatabaseError
            | Self::ConfigError
            | Self::IoError
            | Self::InternalError => 500,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in YouSoul operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `yousoul init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Task not found")]
    TaskNotFound { id: i64 },

    #[error("Not found: {path}")]
    RouteNotFound { path: String },

    #[error("Invalid status: {value}")]
    InvalidStatus {
        value: String,
        suggestion: Option<String>,
    },

    #[error("Invalid priority: {value}")]
    InvalidPriority {
        value: String,
        suggestion: Option<String>,
    },

    #[error("Invalid {field}: {value}")]
    InvalidMood {
        field: &'static str,
        value: String,
        suggestion: Option<String>,
    },

    #[error("{field} is required")]
    RequiredField { field: &'static str },

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::RouteNotFound { .. } => ErrorCode::RouteNotFound,
            Self::InvalidStatus { .. } => ErrorCode::InvalidStatus,
            Self::InvalidPriority { .. } => ErrorCode::InvalidPriority,
            Self::InvalidMood { .. } => ErrorCode::InvalidMood,
            Self::RequiredField { .. } => ErrorCode::RequiredField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::Api { .. } => ErrorCode::ApiError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Http(_) => ErrorCode::HttpError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.error_code().http_status()
    }

    /// Whether the message is safe to show to API callers.
    ///
    /// Storage and I/O failures are logged server-side and replaced by a
    /// generic message in the response body.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.http_status() < 500
    }

    /// Context-aware recovery hint for humans and API clients.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `yousoul init` to create the database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::InvalidStatus { suggestion, .. } => Some(match suggestion {
                Some(s) => format!("Did you mean '{s}'? Valid statuses: backlog, todo, in-progress, done"),
                None => "Valid statuses: backlog, todo, in-progress, done".to_string(),
            }),

            Self::InvalidPriority { suggestion, .. } => Some(match suggestion {
                Some(s) => format!("Did you mean '{s}'? Valid priorities: high, medium, low"),
                None => "Valid priorities: high, medium, low".to_string(),
            }),

            Self::InvalidMood {
                suggestion: Some(s),
                ..
            } => Some(format!("Did you mean '{s}'?")),

            Self::Unauthenticated => Some(
                "Sign in first; requests must carry the identity headers or a bearer token"
                    .to_string(),
            ),

            Self::InvalidMood { .. }
            | Self::TaskNotFound { .. }
            | Self::RouteNotFound { .. }
            | Self::RequiredField { .. }
            | Self::InvalidArgument(_)
            | Self::Api { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Http(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Message placed in the `error` field of API responses.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_public() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }

    /// Structured JSON representation for API responses and `--json` CLI output.
    ///
    /// The `error` field is always a plain string so callers can display it
    /// directly; the code and optional hint sit beside it.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": self.public_message(),
            "code": code.as_str(),
        });

        if let Some(hint) = self.hint() {
            obj["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = Error::TaskNotFound { id: 7 };
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "Task not found");
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = Error::InvalidArgument("items must be an array".to_string());
        assert_eq!(err.http_status(), 400);
        let body = err.to_structured_json();
        assert_eq!(body["error"], "items must be an array");
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        let mut keys: Vec<&str> = body
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, ["code", "error"]);
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = Error::Other("disk on fire".to_string());
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.to_structured_json()["error"], "Internal server error");
    }

    #[test]
    fn test_status_hint_includes_suggestion() {
        let err = Error::InvalidStatus {
            value: "dnoe".to_string(),
            suggestion: Some("done".to_string()),
        };
        let hint = err.hint().unwrap();
        assert!(hint.contains("'done'"));
    }
}

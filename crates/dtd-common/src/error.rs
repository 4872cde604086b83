//! Error types for dynamic tool destination.
//!
//! Only fatal conditions live here. Recoverable configuration defects never
//! surface as errors; they are reported as [`crate::Diagnostic`] values next to
//! the repaired configuration.
//!
//! Errors serialize to structured JSON for the CLI:
//! ```json
//! {
//!   "code": 10,
//!   "category": "config",
//!   "message": "malformed config: Unable to convert size 12 parsecs",
//!   "recoverable": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dynamic tool destination operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration document errors (syntax, shape, size expressions).
    Config,
    /// Byte-size formatting errors.
    Size,
    /// Command-line arguments that do not describe a job.
    Args,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Size => write!(f, "size"),
            ErrorCategory::Args => write!(f, "args"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for dynamic tool destination.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    /// The document cannot be parsed into the expected tree, or a size
    /// expression cannot be converted to bytes. Aborts validation and resolution.
    #[error("malformed config: {0}")]
    MalformedConfig(String),

    #[error("config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    // Size errors (20-29)
    #[error("invalid size: {0}")]
    InvalidSize(String),

    // Argument errors (30-39)
    /// A CLI flag value (job metric or parameter) that cannot be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Size errors
    /// - 30-39: Argument errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::MalformedConfig(_) => 10,
            Error::ConfigNotFound { .. } => 11,
            Error::InvalidSize(_) => 20,
            Error::InvalidArgument(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedConfig(_) | Error::ConfigNotFound { .. } => ErrorCategory::Config,
            Error::InvalidSize(_) => ErrorCategory::Size,
            Error::InvalidArgument(_) => ErrorCategory::Args,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the operator.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Fixable by editing the config file
            Error::MalformedConfig(_) => true,
            Error::ConfigNotFound { .. } => true,

            // Caller passed something that is not a byte count
            Error::InvalidSize(_) => false,
            Error::InvalidArgument(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::MalformedConfig(_) => {
                "Fix the config syntax or size expression, then run 'dtd validate' again."
            }
            Error::ConfigNotFound { .. } => {
                "Pass --config, set DTD_CONFIG, or place tool_destinations.yml in ./config/."
            }
            Error::InvalidSize(_) => "Pass a whole number of bytes, or -1 for unbounded.",
            Error::InvalidArgument(_) => "Check the flag values; see 'dtd resolve --help'.",
            Error::Io(_) => "Check that the config file exists and is readable.",
            Error::Json(_) => "Internal serialization failure; please report it.",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Remediation hint for operators.
    pub remediation: String,

    /// Additional structured context (e.g., file path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        if let Error::ConfigNotFound { path } = err {
            context.insert(
                "path".to_string(),
                serde_json::json!(path.display().to_string()),
            );
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

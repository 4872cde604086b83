//! Dynamic tool destination common types.
//!
//! This crate provides foundational types shared by the validator and the matcher:
//! - The error taxonomy (fatal conditions) and diagnostics (recoverable defects)
//! - The loosely-typed raw configuration tree
//! - Size expression parsing and formatting
//! - Output format specifications

pub mod diagnostic;
pub mod error;
pub mod output;
pub mod raw;
pub mod size;

pub use diagnostic::{DefectKind, Diagnostic, Severity};
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
pub use raw::{RawMap, RawValue};
pub use size::{format_size, format_value, parse_size, parse_size_str, Size};

/// Destination sentinel meaning "refuse to run the job".
pub const FAIL_DESTINATION: &str = "fail";

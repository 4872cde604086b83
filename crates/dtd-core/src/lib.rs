//! Dynamic tool destination core library.
//!
//! This crate provides the rule matcher and the pieces of the `dtd` CLI:
//! - Metrics bundles describing a job
//! - Rule matching and destination resolution
//! - Logging bootstrap
//! - Exit codes

pub mod exit_codes;
pub mod logging;
pub mod matcher;
pub mod metrics;

pub use exit_codes::ExitCode;
pub use matcher::{resolve, resolve_document, DecisionSource, MatchResult, Matcher, Resolution};
pub use metrics::{parse_parameter, MetricsBundle};

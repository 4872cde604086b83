//! Configuration defects found during validation and matching.
//!
//! A [`Diagnostic`] is the recoverable counterpart of [`crate::Error`]: it
//! records what was wrong with one item of the configuration and, in repair
//! mode, what was done about it. Diagnostics never abort processing.

use serde::{Deserialize, Serialize};

/// How bad a defect is for the item it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The item was repaired, ignored, or degraded.
    Debug,
    /// The item cannot be repaired at all.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Itemised configuration defects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// The document is null or empty.
    EmptyConfig,
    /// Top-level `verbose` missing or not a boolean.
    MissingVerbose,
    /// Top-level `default_destination` missing or not a string.
    MissingDefaultDestination,
    /// Unknown top-level key.
    UnrecognizedCategory,
    /// `tools` is not a mapping, or a tool entry is not a mapping.
    MalformedTool,
    /// Tool-level `default_destination` present but not a string.
    InvalidToolDefault,
    /// A tool has neither rules nor a default destination.
    MissingRules,
    /// A rule entry is not a mapping.
    MalformedRule,
    /// A rule has no `rule_type`.
    MissingRuleType,
    /// A rule has a `rule_type` outside the supported set.
    UnrecognizedRuleType,
    /// `nice_value` missing, not an integer, or outside [-20, 20].
    InvalidNiceValue,
    /// `destination` missing or not a string.
    MissingDestination,
    /// `fail_message` given while `destination` is not `fail`.
    ConflictingDestination,
    /// `destination` is `fail` but no `fail_message` was given.
    MissingFailMessage,
    /// A bounded rule lacks `lower_bound` or `upper_bound`.
    MissingBounds,
    /// `lower_bound` exceeds `upper_bound`.
    ReversedBounds,
    /// An `arguments` rule lacks an `arguments` mapping.
    MissingArguments,
    /// A tool was removed from the canonical configuration.
    DroppedTool,
}

impl DefectKind {
    /// Stable snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            DefectKind::EmptyConfig => "empty_config",
            DefectKind::MissingVerbose => "missing_verbose",
            DefectKind::MissingDefaultDestination => "missing_default_destination",
            DefectKind::UnrecognizedCategory => "unrecognized_category",
            DefectKind::MalformedTool => "malformed_tool",
            DefectKind::InvalidToolDefault => "invalid_tool_default",
            DefectKind::MissingRules => "missing_rules",
            DefectKind::MalformedRule => "malformed_rule",
            DefectKind::MissingRuleType => "missing_rule_type",
            DefectKind::UnrecognizedRuleType => "unrecognized_rule_type",
            DefectKind::InvalidNiceValue => "invalid_nice_value",
            DefectKind::MissingDestination => "missing_destination",
            DefectKind::ConflictingDestination => "conflicting_destination",
            DefectKind::MissingFailMessage => "missing_fail_message",
            DefectKind::MissingBounds => "missing_bounds",
            DefectKind::ReversedBounds => "reversed_bounds",
            DefectKind::MissingArguments => "missing_arguments",
            DefectKind::DroppedTool => "dropped_tool",
        }
    }
}

impl std::fmt::Display for DefectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DefectKind,
    /// Operator-facing message, including the fix applied (if any).
    pub message: String,
    /// Tool the defect belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// 1-based rule counter within the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<usize>,
}

impl Diagnostic {
    pub fn debug(kind: DefectKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Debug,
            kind,
            message: message.into(),
            tool: None,
            rule: None,
        }
    }

    pub fn error(kind: DefectKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::debug(kind, message)
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_rule(mut self, rule: usize) -> Self {
        self.rule = Some(rule);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

//! Caller-computed facts about a job.
//!
//! Acquiring these (summing input sizes, counting FASTA records, reading
//! parameter values) happens outside this crate. The matcher only sees the
//! finished bundle.

use dtd_common::{RawMap, RawValue};
use serde::Serialize;

/// Metrics a job is matched against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsBundle {
    /// Total input size in bytes.
    pub file_size: u64,
    /// Total number of input records.
    pub record_count: u64,
    /// Job parameter values by name.
    pub parameters: RawMap,
}

impl MetricsBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size = bytes;
        self
    }

    pub fn with_records(mut self, count: u64) -> Self {
        self.record_count = count;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.parameters.insert(name, value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&RawValue> {
        self.parameters.get(name)
    }
}

/// Split `name=value`, reading the value the way the config file would.
///
/// `careful=true` gives a boolean, `k=5` an integer, `db=-bact` a string.
pub fn parse_parameter(text: &str) -> Result<(String, RawValue), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", text))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", text));
    }
    Ok((name.to_string(), RawValue::from_scalar_str(value.trim())))
}

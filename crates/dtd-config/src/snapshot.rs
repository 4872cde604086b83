//! Configuration snapshots for operator output.
//!
//! A snapshot records which file was validated, its content hash and what
//! validation made of it, so two runs can be compared at a glance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ConfigLocation;
use crate::validate::Validation;

/// A frozen record of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Path the config was read from.
    #[serde(default)]
    pub path: Option<String>,

    /// How the path was chosen.
    pub source: String,

    /// SHA-256 of the config text.
    pub content_hash: String,

    pub valid: bool,
    pub verbose: bool,
    pub has_default_destination: bool,

    /// Tools kept in the canonical config.
    pub tool_count: usize,

    /// Rules kept across all tools.
    pub rule_count: usize,

    /// All recorded defects.
    pub defect_count: usize,

    /// Defects with error severity.
    pub error_count: usize,
}

impl ConfigSnapshot {
    pub fn new(location: &ConfigLocation, text: &str, validation: &Validation) -> Self {
        let config = &validation.config;
        ConfigSnapshot {
            timestamp: Utc::now(),
            path: location.path.as_ref().map(|p| p.display().to_string()),
            source: location.source.to_string(),
            content_hash: hash_content(text),
            valid: validation.valid,
            verbose: config.verbose,
            has_default_destination: config.default_destination.is_some(),
            tool_count: config.tools.len(),
            rule_count: config.rule_count(),
            defect_count: validation.diagnostics.len(),
            error_count: validation.errors().count(),
        }
    }

    /// Check if the config content changed between two snapshots.
    pub fn content_changed(&self, other: &ConfigSnapshot) -> bool {
        self.content_hash != other.content_hash
    }
}

/// Compute SHA-256 hash of content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

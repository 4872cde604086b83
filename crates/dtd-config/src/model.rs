//! Canonical (validated) configuration model.
//!
//! Everything here is produced by [`crate::validate`]; nothing is deserialized
//! directly. The model serializes back to the on-disk schema so a repaired
//! configuration can be written out and validated again.

use std::collections::BTreeMap;

use dtd_common::{parse_size, RawMap, RawValue, Result, Size};
use serde::{Serialize, Serializer};

/// The three supported rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Bounded on the total input size in bytes.
    FileSize,
    /// Bounded on the number of input records.
    Records,
    /// Equality on job parameter values.
    Arguments,
}

impl RuleKind {
    pub const ALL: [RuleKind; 3] = [RuleKind::FileSize, RuleKind::Records, RuleKind::Arguments];

    /// The `rule_type` spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::FileSize => "file_size",
            RuleKind::Records => "records",
            RuleKind::Arguments => "arguments",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether rules of this kind carry `lower_bound`/`upper_bound`.
    pub fn is_bounded(&self) -> bool {
        matches!(self, RuleKind::FileSize | RuleKind::Records)
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bound: the expression as written plus its byte value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub expr: RawValue,
    pub size: Size,
}

impl Bound {
    pub fn parse(expr: RawValue) -> Result<Self> {
        let size = parse_size(&expr)?;
        Ok(Self { expr, size })
    }
}

/// Half-open range `[lower, upper)`; an unbounded upper has no ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Bound,
    pub upper: Bound,
}

impl Bounds {
    pub fn contains(&self, value: u64) -> bool {
        let value = i128::from(value);
        if self.lower.size.as_signed() > value {
            return false;
        }
        self.upper.size.is_unbounded() || value < self.upper.size.as_signed()
    }

    /// True when `lower > upper` and the upper bound is finite.
    pub fn is_reversed(&self) -> bool {
        !self.upper.size.is_unbounded() && self.lower.size.as_signed() > self.upper.size.as_signed()
    }
}

/// A validated rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    /// 1-based position among the tool's raw `rules` entries, dropped ones
    /// included. Messages and match reports name rules by this number.
    pub counter: usize,
    /// Priority; lower wins.
    pub nice_value: i64,
    pub destination: String,
    pub fail_message: Option<String>,
    /// Present for `file_size` and `records` rules.
    pub bounds: Option<Bounds>,
    /// Present for `arguments` rules.
    pub arguments: Option<RawMap>,
}

impl Rule {
    /// Rebuild the raw form, in the on-disk key order.
    pub fn to_raw(&self) -> RawValue {
        let mut map = RawMap::new();
        map.insert("rule_type", RawValue::from(self.kind.as_str()));
        map.insert("nice_value", RawValue::Integer(self.nice_value));
        if let Some(bounds) = &self.bounds {
            map.insert("lower_bound", bounds.lower.expr.clone());
            map.insert("upper_bound", bounds.upper.expr.clone());
        }
        if let Some(arguments) = &self.arguments {
            map.insert("arguments", RawValue::Mapping(arguments.clone()));
        }
        map.insert("destination", RawValue::from(self.destination.as_str()));
        if let Some(message) = &self.fail_message {
            map.insert("fail_message", RawValue::from(message.as_str()));
        }
        RawValue::Mapping(map)
    }
}

/// Per-tool configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolEntry {
    /// Used when no rule matches.
    pub default_destination: Option<String>,
    /// Declaration order is kept; it decides ties.
    pub rules: Vec<Rule>,
}

impl ToolEntry {
    pub fn to_raw(&self) -> RawValue {
        let mut map = RawMap::new();
        if let Some(dest) = &self.default_destination {
            map.insert("default_destination", RawValue::from(dest.as_str()));
        }
        if !self.rules.is_empty() {
            map.insert(
                "rules",
                RawValue::Sequence(self.rules.iter().map(Rule::to_raw).collect()),
            );
        }
        RawValue::Mapping(map)
    }
}

/// Validated, repaired configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalConfig {
    pub verbose: bool,
    pub default_destination: Option<String>,
    /// Keyed case-sensitively by tool id.
    pub tools: BTreeMap<String, ToolEntry>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            default_destination: None,
            tools: BTreeMap::new(),
        }
    }
}

impl CanonicalConfig {
    /// Nothing to resolve against: no global default and no tools.
    pub fn is_empty(&self) -> bool {
        self.default_destination.is_none() && self.tools.is_empty()
    }

    pub fn tool(&self, tool_id: &str) -> Option<&ToolEntry> {
        self.tools.get(tool_id)
    }

    pub fn rule_count(&self) -> usize {
        self.tools.values().map(|t| t.rules.len()).sum()
    }

    /// Rebuild the raw document.
    pub fn to_raw(&self) -> RawValue {
        let mut map = RawMap::new();
        map.insert("verbose", RawValue::Bool(self.verbose));
        if let Some(dest) = &self.default_destination {
            map.insert("default_destination", RawValue::from(dest.as_str()));
        }
        let tools: RawMap = self
            .tools
            .iter()
            .map(|(name, entry)| (name.clone(), entry.to_raw()))
            .collect();
        map.insert("tools", RawValue::Mapping(tools));
        RawValue::Mapping(map)
    }

    /// Render as a JSON value in the on-disk schema.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Render as YAML in the on-disk schema.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| dtd_common::Error::MalformedConfig(format!("cannot render config: {}", e)))
    }
}

impl Serialize for CanonicalConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_raw().serialize(serializer)
    }
}

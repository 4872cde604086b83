//! Configuration validation and repair.
//!
//! [`validate`] turns a raw document into a [`CanonicalConfig`]. Ordinary
//! defects never fail the call: each one is recorded as a [`Diagnostic`],
//! clears the validity flag and, in [`Mode::Repair`], is fixed where a fix
//! exists. Only structurally unusable input (a root that is not a mapping, a
//! bound that is not a size at all) returns `Err`.

use std::collections::BTreeMap;

use dtd_common::{
    DefectKind, Diagnostic, Error, RawMap, RawValue, Result, Severity, FAIL_DESTINATION,
};
use tracing::{debug, error};

use crate::model::{Bound, Bounds, CanonicalConfig, Rule, RuleKind, ToolEntry};

/// Valid `nice_value` range.
pub const NICE_RANGE: std::ops::RangeInclusive<i64> = -20..=20;

/// How defects are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Apply fix-ups and return a usable configuration.
    #[default]
    Repair,
    /// Report validity only. The returned configuration is not authoritative.
    StrictCheckOnly,
}

impl Mode {
    pub fn repairs(&self) -> bool {
        matches!(self, Mode::Repair)
    }
}

/// Outcome of validating a whole document.
#[derive(Debug, Clone)]
pub struct Validation {
    pub config: CanonicalConfig,
    /// False if any defect was found, repaired or not.
    pub valid: bool,
    /// Defects in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Validation {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn has_kind(&self, kind: DefectKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

/// Outcome of validating a single rule entry.
#[derive(Debug, Clone)]
pub struct RuleValidation {
    /// `None` when the rule was dropped.
    pub rule: Option<Rule>,
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Validate a raw document.
pub fn validate(raw: &RawValue, mode: Mode) -> Result<Validation> {
    let mut validator = Validator::new(mode);
    let config = validator.document(raw)?;
    validator.flush(config.verbose);

    Ok(Validation {
        config,
        valid: validator.valid,
        diagnostics: validator.diagnostics,
    })
}

/// Validate one entry of a tool's `rules` list.
///
/// `counter` is the 1-based position used in messages.
pub fn validate_rule(raw: &RawValue, counter: usize, tool: &str, mode: Mode) -> Result<RuleValidation> {
    let mut validator = Validator::new(mode);
    let rule = validator.rule(tool, counter, raw)?;

    Ok(RuleValidation {
        rule,
        valid: validator.valid,
        diagnostics: validator.diagnostics,
    })
}

struct Validator {
    mode: Mode,
    valid: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Validator {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            valid: true,
            diagnostics: Vec::new(),
        }
    }

    fn defect(&mut self, diagnostic: Diagnostic) {
        self.valid = false;
        self.diagnostics.push(diagnostic);
    }

    /// Appends `fix` to `message` when repairs are applied.
    fn describe(&self, message: String, fix: &str) -> String {
        if self.mode.repairs() {
            format!("{} {}", message, fix)
        } else {
            message
        }
    }

    /// Emit collected diagnostics. Errors always; the rest only when verbose.
    fn flush(&self, verbose: bool) {
        if verbose {
            debug!(target: "dtd_config::validate", "Running config validation...");
        }
        for diag in &self.diagnostics {
            match diag.severity {
                Severity::Error => error!(
                    target: "dtd_config::validate",
                    kind = %diag.kind,
                    tool = ?diag.tool,
                    rule = ?diag.rule,
                    "{}",
                    diag.message
                ),
                Severity::Debug if verbose => debug!(
                    target: "dtd_config::validate",
                    kind = %diag.kind,
                    tool = ?diag.tool,
                    rule = ?diag.rule,
                    "{}",
                    diag.message
                ),
                Severity::Debug => {}
            }
        }
        if verbose {
            debug!(target: "dtd_config::validate", "Finished config validation.");
        }
    }

    fn document(&mut self, raw: &RawValue) -> Result<CanonicalConfig> {
        let mut config = CanonicalConfig::default();

        if raw.is_empty_document() {
            self.defect(Diagnostic::debug(
                DefectKind::EmptyConfig,
                "No (or empty) config file supplied!",
            ));
            return Ok(config);
        }

        let root = raw.as_mapping().ok_or_else(|| {
            Error::MalformedConfig(format!(
                "expected a mapping at the top of the config, found a {}",
                raw.type_name()
            ))
        })?;

        let mut verbose_seen = false;
        for (category, value) in root.iter() {
            match category {
                "verbose" => {
                    if let Some(flag) = value.as_bool() {
                        config.verbose = flag;
                        verbose_seen = true;
                    }
                }
                "default_destination" => {
                    if let Some(dest) = value.as_str() {
                        config.default_destination = Some(dest.to_string());
                    }
                }
                "tools" => self.tools(value, &mut config.tools)?,
                other => self.defect(Diagnostic::debug(
                    DefectKind::UnrecognizedCategory,
                    format!("Unrecognized category '{}' found in config file!", other),
                )),
            }
        }

        if !verbose_seen {
            self.defect(Diagnostic::debug(
                DefectKind::MissingVerbose,
                "Missing mandatory field 'verbose' in config file! Defaulting to verbose output.",
            ));
        }
        if config.default_destination.is_none() {
            self.defect(Diagnostic::debug(
                DefectKind::MissingDefaultDestination,
                "No global default destination specified in config!",
            ));
        }

        Ok(config)
    }

    fn tools(&mut self, value: &RawValue, tools: &mut BTreeMap<String, ToolEntry>) -> Result<()> {
        let Some(entries) = value.as_mapping() else {
            self.defect(Diagnostic::debug(
                DefectKind::MalformedTool,
                format!(
                    "Expected a mapping of tools under 'tools', but found a {} instead!",
                    value.type_name()
                ),
            ));
            return Ok(());
        };

        for (name, entry) in entries.iter() {
            if let Some(entry) = self.tool(name, entry)? {
                tools.insert(name.to_string(), entry);
            }
        }
        Ok(())
    }

    fn tool(&mut self, tool: &str, value: &RawValue) -> Result<Option<ToolEntry>> {
        let fields = match value {
            RawValue::Mapping(fields) => fields,
            RawValue::Sequence(_) => {
                self.defect(
                    Diagnostic::error(
                        DefectKind::MalformedTool,
                        "Malformed config; expected tool name, but found a list instead!",
                    )
                    .with_tool(tool),
                );
                return Ok(None);
            }
            other => {
                self.defect(
                    Diagnostic::debug(
                        DefectKind::MalformedTool,
                        format!(
                            "Expected settings for '{}', but found a {} instead. Ignoring...",
                            tool,
                            other.type_name()
                        ),
                    )
                    .with_tool(tool),
                );
                return Ok(None);
            }
        };

        let mut entry = ToolEntry::default();

        match fields.get("default_destination") {
            Some(RawValue::String(dest)) => entry.default_destination = Some(dest.clone()),
            Some(other) => self.defect(
                Diagnostic::debug(
                    DefectKind::InvalidToolDefault,
                    format!(
                        "Default destination for '{}' must be a string, but found a {}. Ignoring...",
                        tool,
                        other.type_name()
                    ),
                )
                .with_tool(tool),
            ),
            None => {}
        }

        match fields.get("rules") {
            Some(RawValue::Sequence(rules)) => {
                for (idx, raw_rule) in rules.iter().enumerate() {
                    if let Some(rule) = self.rule(tool, idx + 1, raw_rule)? {
                        entry.rules.push(rule);
                    }
                }
                if rules.is_empty() && entry.default_destination.is_none() {
                    self.missing_rules(tool);
                }
            }
            None | Some(RawValue::Null) => {
                if entry.default_destination.is_none() {
                    self.missing_rules(tool);
                }
            }
            Some(other) => self.defect(
                Diagnostic::debug(
                    DefectKind::MissingRules,
                    format!(
                        "Expected a list of rules for '{}', but found a {} instead!",
                        tool,
                        other.type_name()
                    ),
                )
                .with_tool(tool),
            ),
        }

        if entry.default_destination.is_none() && entry.rules.is_empty() {
            self.defect(
                Diagnostic::debug(
                    DefectKind::DroppedTool,
                    format!(
                        "'{}' has no usable rules and no default destination. Ignoring...",
                        tool
                    ),
                )
                .with_tool(tool),
            );
            return Ok(None);
        }

        Ok(Some(entry))
    }

    fn missing_rules(&mut self, tool: &str) {
        self.defect(
            Diagnostic::debug(DefectKind::MissingRules, format!("No rules found for '{}'!", tool))
                .with_tool(tool),
        );
    }

    /// Validate one rule; `Ok(None)` means it was dropped.
    fn rule(&mut self, tool: &str, counter: usize, raw: &RawValue) -> Result<Option<Rule>> {
        let Some(fields) = raw.as_mapping() else {
            self.defect(
                Diagnostic::debug(
                    DefectKind::MalformedRule,
                    format!(
                        "Rule {} in '{}' should be a mapping, but found a {}. Ignoring...",
                        counter,
                        tool,
                        raw.type_name()
                    ),
                )
                .with_tool(tool)
                .with_rule(counter),
            );
            return Ok(None);
        };

        let kind = match fields.get("rule_type") {
            None | Some(RawValue::Null) => {
                self.defect(
                    Diagnostic::debug(
                        DefectKind::MissingRuleType,
                        format!("No rule_type found for rule {} in '{}'.", counter, tool),
                    )
                    .with_tool(tool)
                    .with_rule(counter),
                );
                return Ok(None);
            }
            Some(value) => match value.as_str().and_then(RuleKind::from_name) {
                Some(kind) => kind,
                None => {
                    let message = self.describe(
                        format!("Unrecognized rule_type '{}' found in '{}'.", value, tool),
                        "Ignoring...",
                    );
                    self.defect(
                        Diagnostic::debug(DefectKind::UnrecognizedRuleType, message)
                            .with_tool(tool)
                            .with_rule(counter),
                    );
                    return Ok(None);
                }
            },
        };

        let ctx = RuleContext { tool, counter };
        let nice_value = self.nice_value(ctx, fields.get("nice_value"));
        let (destination, fail_message) = self.destination(ctx, fields);
        let (bounds, arguments) = if kind.is_bounded() {
            match self.bounds(ctx, fields)? {
                Some(bounds) => (Some(bounds), None),
                None => return Ok(None),
            }
        } else {
            match self.arguments(ctx, fields) {
                Some(arguments) => (None, Some(arguments)),
                None => return Ok(None),
            }
        };

        let Some(destination) = destination else {
            return Ok(None);
        };

        Ok(Some(Rule {
            kind,
            counter,
            nice_value,
            destination,
            fail_message,
            bounds,
            arguments,
        }))
    }

    fn nice_value(&mut self, ctx: RuleContext<'_>, value: Option<&RawValue>) -> i64 {
        let parsed = match value {
            Some(RawValue::Integer(n)) => Some(*n),
            Some(RawValue::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        let (message, kept) = match (value, parsed) {
            (_, Some(n)) if NICE_RANGE.contains(&n) => return n,
            (_, Some(n)) => (
                format!(
                    "nice_value goes from -20 to 20; rule {} in '{}' has a nice_value of '{}'.",
                    ctx.counter, ctx.tool, n
                ),
                n,
            ),
            (None, None) | (Some(RawValue::Null), None) => (
                format!("No nice_value found for rule {} in '{}'.", ctx.counter, ctx.tool),
                0,
            ),
            (Some(other), None) => (
                format!(
                    "nice_value for rule {} in '{}' must be an integer, but found '{}'.",
                    ctx.counter, ctx.tool, other
                ),
                0,
            ),
        };

        let message = self.describe(message, "Setting nice_value to 0.");
        self.defect(ctx.debug(DefectKind::InvalidNiceValue, message));
        if self.mode.repairs() {
            0
        } else {
            kept
        }
    }

    /// Returns the destination (`None` if unusable) and the fail message.
    fn destination(&mut self, ctx: RuleContext<'_>, fields: &RawMap) -> (Option<String>, Option<String>) {
        let fail_message = match fields.get("fail_message") {
            None | Some(RawValue::Null) => None,
            Some(RawValue::String(message)) => Some(message.clone()),
            Some(other) => Some(other.to_string()),
        };
        let declared = fields.get("destination");

        if let Some(message) = fail_message {
            if declared.and_then(RawValue::as_str) != Some(FAIL_DESTINATION) {
                self.defect(ctx.debug(
                    DefectKind::ConflictingDestination,
                    format!(
                        "Rule {} in '{}' has a fail_message but its destination is not 'fail'. Setting destination to 'fail'.",
                        ctx.counter, ctx.tool
                    ),
                ));
            }
            return (Some(FAIL_DESTINATION.to_string()), Some(message));
        }

        match declared {
            Some(RawValue::String(dest)) if dest == FAIL_DESTINATION => {
                let message = self.describe(
                    format!("Missing a fail_message for rule {} in '{}'.", ctx.counter, ctx.tool),
                    "Adding generic fail_message.",
                );
                self.defect(ctx.debug(DefectKind::MissingFailMessage, message));
                let synthesized = self
                    .mode
                    .repairs()
                    .then(|| generic_fail_message(ctx.counter, ctx.tool));
                (Some(dest.clone()), synthesized)
            }
            Some(RawValue::String(dest)) => (Some(dest.clone()), None),
            _ => {
                let message = format!(
                    "No destination specified for rule {} in '{}'. Ignoring...",
                    ctx.counter, ctx.tool
                );
                self.defect(ctx.debug(DefectKind::MissingDestination, message));
                (None, None)
            }
        }
    }

    fn bounds(&mut self, ctx: RuleContext<'_>, fields: &RawMap) -> Result<Option<Bounds>> {
        let lower = fields.get("lower_bound").filter(|v| !v.is_null());
        let upper = fields.get("upper_bound").filter(|v| !v.is_null());

        let (Some(lower), Some(upper)) = (lower, upper) else {
            self.defect(ctx.debug(
                DefectKind::MissingBounds,
                format!(
                    "Missing bounds for rule {} in '{}'. Ignoring rule.",
                    ctx.counter, ctx.tool
                ),
            ));
            return Ok(None);
        };

        let mut bounds = Bounds {
            lower: Bound::parse(lower.clone())?,
            upper: Bound::parse(upper.clone())?,
        };

        if bounds.is_reversed() {
            let message = self.describe(
                format!(
                    "lower_bound exceeds upper_bound for rule {} in '{}'.",
                    ctx.counter, ctx.tool
                ),
                "Reversing bounds.",
            );
            self.defect(ctx.debug(DefectKind::ReversedBounds, message));
            if self.mode.repairs() {
                std::mem::swap(&mut bounds.lower, &mut bounds.upper);
            }
        }

        Ok(Some(bounds))
    }

    fn arguments(&mut self, ctx: RuleContext<'_>, fields: &RawMap) -> Option<RawMap> {
        match fields.get("arguments") {
            Some(RawValue::Mapping(arguments)) => Some(arguments.clone()),
            _ => {
                self.defect(ctx.debug(
                    DefectKind::MissingArguments,
                    format!(
                        "No arguments found for rule {} in '{}' despite being of type arguments. Ignoring rule.",
                        ctx.counter, ctx.tool
                    ),
                ));
                None
            }
        }
    }
}

/// Message used when a `fail` rule carries no message of its own.
pub fn generic_fail_message(counter: usize, tool: &str) -> String {
    format!("Invalid parameters for rule {} in '{}'.", counter, tool)
}

#[derive(Clone, Copy)]
struct RuleContext<'a> {
    tool: &'a str,
    counter: usize,
}

impl RuleContext<'_> {
    fn debug(&self, kind: DefectKind, message: impl Into<String>) -> Diagnostic {
        Diagnostic::debug(kind, message)
            .with_tool(self.tool)
            .with_rule(self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawValue {
        RawValue::from_yaml(serde_yaml::from_str(text).unwrap()).unwrap()
    }

    fn only_rule(validation: &Validation, tool: &str) -> Rule {
        let entry = validation.config.tool(tool).expect("tool kept");
        assert_eq!(entry.rules.len(), 1);
        entry.rules[0].clone()
    }

    const VALID: &str = r#"
verbose: true
default_destination: waffles_default
tools:
  spades:
    rules:
      - rule_type: file_size
        nice_value: 0
        lower_bound: 0
        upper_bound: 100000000
        destination: things
"#;

    #[test]
    fn test_valid_document() {
        let v = validate(&raw(VALID), Mode::Repair).unwrap();
        assert!(v.valid, "{:?}", v.diagnostics);
        assert!(v.diagnostics.is_empty());
        assert_eq!(v.config.default_destination.as_deref(), Some("waffles_default"));
        let rule = only_rule(&v, "spades");
        assert_eq!(rule.kind, RuleKind::FileSize);
        assert_eq!(rule.destination, "things");
    }

    #[test]
    fn test_empty_document() {
        for doc in [RawValue::Null, RawValue::Mapping(RawMap::new())] {
            let v = validate(&doc, Mode::Repair).unwrap();
            assert!(!v.valid);
            assert_eq!(v.diagnostics.len(), 1);
            assert_eq!(v.diagnostics[0].kind, DefectKind::EmptyConfig);
            assert!(v.config.is_empty());
        }
    }

    #[test]
    fn test_non_mapping_root_is_fatal() {
        let err = validate(&RawValue::from("just a string"), Mode::Repair).unwrap_err();
        assert!(matches!(err, Error::MalformedConfig(_)));
    }

    #[test]
    fn test_missing_verbose_defaults_on() {
        let v = validate(&raw("default_destination: d\ntools: {}\n"), Mode::Repair).unwrap();
        assert!(!v.valid);
        assert!(v.config.verbose);
        assert!(v.has_kind(DefectKind::MissingVerbose));
    }

    #[test]
    fn test_non_boolean_verbose_is_a_defect() {
        let v = validate(&raw("verbose: yes please\ndefault_destination: d\n"), Mode::Repair).unwrap();
        assert!(v.has_kind(DefectKind::MissingVerbose));
        assert!(v.config.verbose);
    }

    #[test]
    fn test_missing_global_default() {
        let v = validate(&raw("verbose: false\ntools: {}\n"), Mode::Repair).unwrap();
        assert!(!v.valid);
        assert!(v.has_kind(DefectKind::MissingDefaultDestination));
        assert!(v.config.default_destination.is_none());
    }

    #[test]
    fn test_unrecognized_category_keeps_going() {
        let v = validate(
            &raw("verbose: true\nwaffles: 3\ndefault_destination: d\n"),
            Mode::Repair,
        )
        .unwrap();
        assert!(!v.valid);
        assert!(v.has_kind(DefectKind::UnrecognizedCategory));
        assert_eq!(v.config.default_destination.as_deref(), Some("d"));
    }

    #[test]
    fn test_list_tool_is_error_severity() {
        let v = validate(
            &raw("verbose: true\ndefault_destination: d\ntools:\n  spades:\n    - rule_type: file_size\n"),
            Mode::Repair,
        )
        .unwrap();
        assert!(!v.valid);
        assert_eq!(v.errors().count(), 1);
        assert!(v.config.tool("spades").is_none());
    }

    #[test]
    fn test_tool_with_only_default_is_kept() {
        let v = validate(
            &raw("verbose: true\ndefault_destination: d\ntools:\n  spades:\n    default_destination: cluster\n"),
            Mode::Repair,
        )
        .unwrap();
        assert!(v.valid, "{:?}", v.diagnostics);
        let entry = v.config.tool("spades").unwrap();
        assert_eq!(entry.default_destination.as_deref(), Some("cluster"));
        assert!(entry.rules.is_empty());
    }

    #[test]
    fn test_tool_without_rules_or_default_is_dropped() {
        let v = validate(
            &raw("verbose: true\ndefault_destination: d\ntools:\n  spades:\n    rules: []\n"),
            Mode::Repair,
        )
        .unwrap();
        assert!(!v.valid);
        assert!(v.has_kind(DefectKind::MissingRules));
        assert!(v.config.tool("spades").is_none());
    }

    #[test]
    fn test_nice_value_out_of_range_repaired() {
        let rule = raw("rule_type: records\nnice_value: -21\nlower_bound: 0\nupper_bound: 10\ndestination: x\n");
        let checked = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap();
        assert!(!checked.valid);
        assert_eq!(checked.rule.unwrap().nice_value, 0);
        assert!(checked.diagnostics[0].message.ends_with("Setting nice_value to 0."));

        let strict = validate_rule(&rule, 1, "spades", Mode::StrictCheckOnly).unwrap();
        assert!(!strict.valid);
        assert_eq!(strict.rule.unwrap().nice_value, -21);
        assert!(!strict.diagnostics[0].message.contains("Setting"));
    }

    #[test]
    fn test_nice_value_missing_or_string() {
        let rule = raw("rule_type: records\nlower_bound: 0\nupper_bound: 10\ndestination: x\n");
        let checked = validate_rule(&rule, 2, "spades", Mode::Repair).unwrap();
        assert!(!checked.valid);
        assert_eq!(checked.rule.unwrap().nice_value, 0);
        assert_eq!(
            checked.diagnostics[0].message,
            "No nice_value found for rule 2 in 'spades'. Setting nice_value to 0."
        );

        let rule = raw("rule_type: records\nnice_value: '-5'\nlower_bound: 0\nupper_bound: 10\ndestination: x\n");
        let checked = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap();
        assert!(checked.valid);
        assert_eq!(checked.rule.unwrap().nice_value, -5);
    }

    #[test]
    fn test_fail_message_forces_fail_destination() {
        let rule = raw("rule_type: records\nnice_value: 0\nlower_bound: 0\nupper_bound: 10\ndestination: cluster\nfail_message: too big\n");
        for mode in [Mode::Repair, Mode::StrictCheckOnly] {
            let checked = validate_rule(&rule, 1, "spades", mode).unwrap();
            assert!(!checked.valid);
            let rule = checked.rule.unwrap();
            assert_eq!(rule.destination, FAIL_DESTINATION);
            assert_eq!(rule.fail_message.as_deref(), Some("too big"));
        }
    }

    #[test]
    fn test_fail_without_message_gets_generic_one() {
        let rule = raw("rule_type: records\nnice_value: 0\nlower_bound: 0\nupper_bound: 10\ndestination: fail\n");
        let checked = validate_rule(&rule, 3, "spades", Mode::Repair).unwrap();
        assert!(!checked.valid);
        assert_eq!(
            checked.rule.unwrap().fail_message.as_deref(),
            Some("Invalid parameters for rule 3 in 'spades'.")
        );

        let strict = validate_rule(&rule, 3, "spades", Mode::StrictCheckOnly).unwrap();
        assert!(strict.rule.unwrap().fail_message.is_none());
    }

    #[test]
    fn test_missing_destination_drops_rule() {
        let rule = raw("rule_type: records\nnice_value: 0\nlower_bound: 0\nupper_bound: 10\n");
        let checked = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap();
        assert!(!checked.valid);
        assert!(checked.rule.is_none());
        assert_eq!(checked.diagnostics[0].kind, DefectKind::MissingDestination);
    }

    #[test]
    fn test_missing_bounds_drop_rule_in_both_modes() {
        let rule = raw("rule_type: file_size\nnice_value: 0\nlower_bound: 0\nupper_bound: ~\ndestination: x\n");
        for mode in [Mode::Repair, Mode::StrictCheckOnly] {
            let checked = validate_rule(&rule, 1, "spades", mode).unwrap();
            assert!(checked.rule.is_none());
            assert_eq!(checked.diagnostics[0].kind, DefectKind::MissingBounds);
        }
    }

    #[test]
    fn test_reversed_bounds_swapped_in_repair_only() {
        let rule = raw("rule_type: file_size\nnice_value: 0\nlower_bound: 100\nupper_bound: 1\ndestination: x\n");

        let repaired = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap();
        assert!(!repaired.valid);
        let bounds = repaired.rule.unwrap().bounds.unwrap();
        assert_eq!(bounds.lower.expr, RawValue::Integer(1));
        assert_eq!(bounds.upper.expr, RawValue::Integer(100));

        let strict = validate_rule(&rule, 1, "spades", Mode::StrictCheckOnly).unwrap();
        assert!(!strict.valid);
        let bounds = strict.rule.unwrap().bounds.unwrap();
        assert_eq!(bounds.lower.expr, RawValue::Integer(100));
    }

    #[test]
    fn test_infinite_upper_bound_is_not_reversed() {
        let rule = raw("rule_type: file_size\nnice_value: 0\nlower_bound: 1 GB\nupper_bound: Infinity\ndestination: x\n");
        let checked = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap();
        assert!(checked.valid, "{:?}", checked.diagnostics);
    }

    #[test]
    fn test_unparseable_bound_is_fatal() {
        let rule = raw("rule_type: file_size\nnice_value: 0\nlower_bound: 12 parsecs\nupper_bound: 1 KB\ndestination: x\n");
        let err = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap_err();
        assert!(err.to_string().contains("Unable to convert size 12 parsecs"));
    }

    #[test]
    fn test_arguments_rule_needs_mapping() {
        let rule = raw("rule_type: arguments\nnice_value: 0\narguments: [careful]\ndestination: x\n");
        let checked = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap();
        assert!(checked.rule.is_none());
        assert_eq!(checked.diagnostics[0].kind, DefectKind::MissingArguments);

        let rule = raw("rule_type: arguments\nnice_value: 0\narguments:\n  careful: true\ndestination: x\n");
        let checked = validate_rule(&rule, 1, "spades", Mode::Repair).unwrap();
        assert!(checked.valid);
        assert!(checked.rule.unwrap().arguments.unwrap().contains_key("careful"));
    }

    #[test]
    fn test_bad_rule_types_dropped_and_counter_advances() {
        let v = validate(
            &raw(
                r#"
verbose: true
default_destination: d
tools:
  spades:
    rules:
      - nice_value: 0
      - rule_type: colour
      - rule_type: records
        nice_value: 0
        lower_bound: 0
        upper_bound: 10
"#,
            ),
            Mode::Repair,
        )
        .unwrap();
        assert!(!v.valid);
        assert!(v.has_kind(DefectKind::MissingRuleType));
        assert!(v.has_kind(DefectKind::UnrecognizedRuleType));
        let missing = v
            .diagnostics
            .iter()
            .find(|d| d.kind == DefectKind::MissingDestination)
            .unwrap();
        assert_eq!(missing.rule, Some(3));
        assert!(v.has_kind(DefectKind::DroppedTool));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let doc = raw("verbose: true\ndefault_destination: d\ntools:\n  t:\n    rules:\n      - rule_type: records\n        lower_bound: 9\n        upper_bound: 1\n        destination: x\n");
        let before = doc.clone();
        let _ = validate(&doc, Mode::Repair).unwrap();
        assert_eq!(doc, before);
    }
}

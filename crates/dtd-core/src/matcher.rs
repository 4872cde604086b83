//! Rule matching: canonical config + tool id + metrics → destination.
//!
//! Every rule of the tool is evaluated. Among the applicable ones the lowest
//! `nice_value` wins; on a tie the earlier rule keeps its place. With no
//! applicable rule the tool default applies, then the global default. A final
//! destination of `fail` refuses the job.

use dtd_common::{format_size, RawMap, Result, Size, FAIL_DESTINATION};
use dtd_config::validate::generic_fail_message;
use dtd_config::{load_str, CanonicalConfig, Mode, Rule, RuleKind};
use serde::Serialize;
use tracing::debug;

use crate::metrics::MetricsBundle;

const TARGET: &str = "dtd_core::matcher";

/// Outcome of resolving one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum MatchResult {
    /// Run the job here.
    Destination(String),
    /// Refuse the job, with the reason.
    Failure(String),
}

impl MatchResult {
    pub fn is_destination(&self) -> bool {
        matches!(self, MatchResult::Destination(_))
    }

    pub fn destination(&self) -> Option<&str> {
        match self {
            MatchResult::Destination(dest) => Some(dest),
            MatchResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            MatchResult::Failure(message) => Some(message),
            MatchResult::Destination(_) => None,
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Destination(dest) => write!(f, "{}", dest),
            MatchResult::Failure(message) => write!(f, "refused: {}", message),
        }
    }
}

/// What decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionSource {
    /// A rule matched; `index` is its 1-based entry number in the tool's `rules`.
    Rule { index: usize, kind: RuleKind },
    ToolDefault,
    GlobalDefault,
    /// No config or no global default.
    Unresolvable,
}

/// Detailed resolution for operator output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub tool: String,
    pub result: MatchResult,
    pub source: DecisionSource,
    /// Whether the tool has an entry in the config.
    pub tool_known: bool,
}

/// Evaluates jobs against one canonical config.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    config: Option<&'a CanonicalConfig>,
}

impl<'a> Matcher<'a> {
    pub fn new(config: &'a CanonicalConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// A matcher that may have no config at all.
    pub fn from_option(config: Option<&'a CanonicalConfig>) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, tool: &str, metrics: &MetricsBundle) -> Resolution {
        let refuse = |message: String| Resolution {
            tool: tool.to_string(),
            result: MatchResult::Failure(message),
            source: DecisionSource::Unresolvable,
            tool_known: false,
        };

        let Some(config) = self.config.filter(|c| !c.is_empty()) else {
            return refuse("no config supplied".to_string());
        };
        let verbose = config.verbose;

        if verbose {
            debug!(target: TARGET, "Total size: {}", format_size(Size::from(metrics.file_size), "YB"));
            debug!(target: TARGET, "Total amount of records: {}", metrics.record_count);
        }

        let Some(global) = config.default_destination.as_deref() else {
            return refuse(format!(
                "Job '{}' failed; no global default destination specified in config!",
                tool
            ));
        };

        let Some(entry) = config.tool(tool) else {
            if verbose {
                debug!(
                    target: TARGET,
                    "Tool '{}' not specified in config. Using default destination.", tool
                );
            }
            return fallback(tool, global, DecisionSource::GlobalDefault, false);
        };

        let mut winner: Option<&Rule> = None;
        for rule in &entry.rules {
            if !rule_matches(rule, metrics, verbose) {
                continue;
            }
            if winner.map_or(true, |best| rule.nice_value < best.nice_value) {
                winner = Some(rule);
            }
        }

        match winner {
            Some(rule) => {
                let index = rule.counter;
                if verbose {
                    debug!(
                        target: TARGET,
                        tool,
                        rule = index,
                        kind = %rule.kind,
                        nice_value = rule.nice_value,
                        destination = %rule.destination,
                        "rule matched"
                    );
                }
                let result = if rule.destination == FAIL_DESTINATION {
                    MatchResult::Failure(
                        rule.fail_message
                            .clone()
                            .unwrap_or_else(|| generic_fail_message(index, tool)),
                    )
                } else {
                    MatchResult::Destination(rule.destination.clone())
                };
                Resolution {
                    tool: tool.to_string(),
                    result,
                    source: DecisionSource::Rule {
                        index,
                        kind: rule.kind,
                    },
                    tool_known: true,
                }
            }
            None => match entry.default_destination.as_deref() {
                Some(dest) => fallback(tool, dest, DecisionSource::ToolDefault, true),
                None => fallback(tool, global, DecisionSource::GlobalDefault, true),
            },
        }
    }

    pub fn resolve(&self, tool: &str, metrics: &MetricsBundle) -> MatchResult {
        self.evaluate(tool, metrics).result
    }
}

fn fallback(tool: &str, dest: &str, source: DecisionSource, tool_known: bool) -> Resolution {
    let result = if dest == FAIL_DESTINATION {
        MatchResult::Failure(format!("No default destination for '{}'; job refused.", tool))
    } else {
        MatchResult::Destination(dest.to_string())
    };
    Resolution {
        tool: tool.to_string(),
        result,
        source,
        tool_known,
    }
}

/// Resolve a job against an optional canonical config.
pub fn resolve(config: Option<&CanonicalConfig>, tool: &str, metrics: &MetricsBundle) -> MatchResult {
    Matcher::from_option(config).resolve(tool, metrics)
}

/// Load, repair and resolve in one call.
///
/// A malformed document (bad syntax, unconvertible size) is an error, not a
/// failure result.
pub fn resolve_document(text: &str, tool: &str, metrics: &MetricsBundle) -> Result<MatchResult> {
    let validation = load_str(text, Mode::Repair)?;
    Ok(resolve(Some(&validation.config), tool, metrics))
}

/// Whether `rule` applies to a job with these metrics.
pub fn rule_matches(rule: &Rule, metrics: &MetricsBundle, verbose: bool) -> bool {
    match rule.kind {
        RuleKind::FileSize => rule
            .bounds
            .as_ref()
            .is_some_and(|b| b.contains(metrics.file_size)),
        RuleKind::Records => rule
            .bounds
            .as_ref()
            .is_some_and(|b| b.contains(metrics.record_count)),
        RuleKind::Arguments => rule
            .arguments
            .as_ref()
            .is_some_and(|expected| arguments_match(expected, &metrics.parameters, verbose)),
    }
}

/// Every expected argument must be present with an equal value.
fn arguments_match(expected: &RawMap, parameters: &RawMap, verbose: bool) -> bool {
    let mut matched = true;
    for (name, want) in expected.iter() {
        match parameters.get(name) {
            Some(found) if found == want => {}
            Some(found) => {
                matched = false;
                if verbose {
                    debug!(
                        target: TARGET,
                        "Parameter value unequal -- '{}' expected '{}', found '{}'.", name, want, found
                    );
                }
            }
            None => {
                matched = false;
                if verbose {
                    debug!(target: TARGET, "Argument '{}' not recognized!", name);
                }
            }
        }
    }
    matched
}

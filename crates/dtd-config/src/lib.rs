//! Dynamic tool destination configuration loading and validation.
//!
//! This crate provides:
//! - The canonical (validated) configuration model
//! - Validation with repair or strict checking, and itemised diagnostics
//! - YAML loading
//! - Config resolution (CLI → env → working dir → XDG → system)
//! - Config snapshots for operator output

pub mod load;
pub mod model;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use load::{load_file, load_str, parse_document};
pub use model::{Bound, Bounds, CanonicalConfig, Rule, RuleKind, ToolEntry};
pub use resolve::{resolve_config_path, ConfigLocation, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate, validate_rule, Mode, RuleValidation, Validation};

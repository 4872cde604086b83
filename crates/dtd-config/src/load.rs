//! Reading configuration documents from text and files.

use std::path::Path;

use dtd_common::{Error, RawValue, Result};
use tracing::error;

use crate::validate::{validate, Mode, Validation};

/// Parse YAML text into a raw document. Blank text is an empty document.
pub fn parse_document(text: &str) -> Result<RawValue> {
    if text.trim().is_empty() {
        return Ok(RawValue::Null);
    }

    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
        error!(target: "dtd_config::load", error = %e, "Config file is too malformed to fix!");
        Error::MalformedConfig(format!("Config file is too malformed to fix: {}", e))
    })?;
    RawValue::from_yaml(value)
}

/// Parse and validate YAML text.
pub fn load_str(text: &str, mode: Mode) -> Result<Validation> {
    let raw = parse_document(text)?;
    validate(&raw, mode)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path, mode: Mode) -> Result<Validation> {
    let text = read_config(path)?;
    load_str(&text, mode)
}

/// Read a config file, mapping a missing file to [`Error::ConfigNotFound`].
pub fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ConfigNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })
}

//! Configuration path discovery.
//!
//! Resolution order: CLI argument → environment → working directory → XDG → system.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via `DTD_CONFIG` or `DTD_CONFIG_DIR`.
    Environment,

    /// `./config/tool_destinations.yml` relative to the working directory.
    WorkingDirectory,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/dynamic-tool-destination/.
    SystemConfig,

    /// No configuration file anywhere.
    #[default]
    NotFound,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::WorkingDirectory => write!(f, "working directory"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::NotFound => write!(f, "not found"),
        }
    }
}

/// A resolved configuration location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigLocation {
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

impl ConfigLocation {
    fn found(path: PathBuf, source: ConfigSource) -> Self {
        Self {
            path: Some(path),
            source,
        }
    }
}

/// Environment variable holding a config file path.
pub const ENV_CONFIG_PATH: &str = "DTD_CONFIG";
/// Environment variable holding a directory containing [`CONFIG_FILENAME`].
pub const ENV_CONFIG_DIR: &str = "DTD_CONFIG_DIR";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "tool_destinations.yml";

/// Application name for XDG and system directories.
const APP_NAME: &str = "dynamic-tool-destination";

/// Resolve the configuration path.
///
/// 1. Explicit CLI path
/// 2. `DTD_CONFIG`
/// 3. `DTD_CONFIG_DIR` + filename
/// 4. `./config/tool_destinations.yml`
/// 5. XDG config directory (~/.config/dynamic-tool-destination/)
/// 6. System config (/etc/dynamic-tool-destination/)
///
/// Explicit paths (1 and 2) are returned even if they do not exist, so that
/// loading reports the missing file instead of silently using another one.
pub fn resolve_config_path(cli_path: Option<&Path>) -> ConfigLocation {
    if let Some(path) = cli_path {
        return ConfigLocation::found(path.to_path_buf(), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        if !env_path.is_empty() {
            return ConfigLocation::found(PathBuf::from(env_path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return ConfigLocation::found(path, ConfigSource::Environment);
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join("config").join(CONFIG_FILENAME);
        if path.exists() {
            return ConfigLocation::found(path, ConfigSource::WorkingDirectory);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return ConfigLocation::found(path, ConfigSource::XdgConfig);
        }
    }

    let system_path = system_config_dir().join(CONFIG_FILENAME);
    if system_path.exists() {
        return ConfigLocation::found(system_path, ConfigSource::SystemConfig);
    }

    ConfigLocation::default()
}

/// Get the XDG config directory for dynamic-tool-destination.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

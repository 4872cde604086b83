//! Logging configuration for `dtd`.
//!
//! The level comes from `-v`/`-q`, else `DTD_LOG`, else raw `RUST_LOG`
//! directives, else `warn`. Validation defects and matcher decisions are
//! debug events, so `-v` is what surfaces them.

use clap::ValueEnum;

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Jsonl,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// How much of the validator and matcher to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, ValueEnum)]
pub enum LogLevel {
    /// Malformed documents and unrepairable tools only (`-q`).
    Error,
    #[default]
    Warn,
    /// Every config defect and each rule decision (`-v`).
    Debug,
    /// Everything, including per-argument comparisons (`-vv`).
    Trace,
}

impl LogLevel {
    /// Map `-q` and the `-v` count; `None` leaves the environment in charge.
    pub fn from_flags(verbose: u8, quiet: bool) -> Option<Self> {
        match (quiet, verbose) {
            (true, _) => Some(LogLevel::Error),
            (false, 0) => None,
            (false, 1) => Some(LogLevel::Debug),
            (false, _) => Some(LogLevel::Trace),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Raw `RUST_LOG` directives, used verbatim when nothing else set a level.
    pub directives: Option<String>,
}

impl LogConfig {
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_vars(
            std::env::var("DTD_LOG").ok().as_deref(),
            std::env::var("RUST_LOG").ok().as_deref(),
            std::env::var("DTD_LOG_FORMAT").ok().as_deref(),
            cli_level,
            cli_format,
        )
    }

    pub fn from_vars(
        dtd_log: Option<&str>,
        rust_log: Option<&str>,
        log_format: Option<&str>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_level = dtd_log.and_then(|v| LogLevel::from_str(v.trim(), true).ok());
        let env_format = log_format.and_then(|v| LogFormat::from_str(v.trim(), true).ok());

        let level = cli_level.or(env_level);
        let directives = match level {
            Some(_) => None,
            None => rust_log
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        };

        LogConfig {
            format: cli_format.or(env_format).unwrap_or_default(),
            level: level.unwrap_or_default(),
            directives,
        }
    }

    /// Directives for `EnvFilter`, scoped to this workspace's targets.
    pub fn filter_directives(&self) -> String {
        match &self.directives {
            Some(directives) => directives.clone(),
            None => format!(
                "dtd_core={level},dtd_config={level},dtd={level}",
                level = self.level
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_to_level() {
        assert_eq!(LogLevel::from_flags(0, false), None);
        assert_eq!(LogLevel::from_flags(1, false), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_flags(3, false), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_flags(2, true), Some(LogLevel::Error));
    }

    #[test]
    fn test_env_values_are_case_insensitive() {
        let config = LogConfig::from_vars(Some("DEBUG"), None, Some("JsonL"), None, None);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Jsonl);

        let config = LogConfig::from_vars(Some("loud"), None, Some("xml"), None, None);
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_precedence() {
        let config = LogConfig::from_vars(Some("debug"), Some("trace"), None, None, None);
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.directives.is_none());

        let config = LogConfig::from_vars(None, Some("dtd_core=trace"), None, None, None);
        assert_eq!(config.filter_directives(), "dtd_core=trace");

        let config = LogConfig::from_vars(
            None,
            Some("dtd_core=trace"),
            Some("jsonl"),
            Some(LogLevel::Error),
            Some(LogFormat::Human),
        );
        assert_eq!(config.level, LogLevel::Error);
        assert_eq!(config.format, LogFormat::Human);
        assert!(config.directives.is_none());
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            LogConfig::default().filter_directives(),
            "dtd_core=warn,dtd_config=warn,dtd=warn"
        );
    }
}

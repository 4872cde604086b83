//! Dynamic Tool Destination - operator CLI
//!
//! The `dtd` binary handles:
//! - Config validation (repair or strict), with the repaired config on request
//! - Resolving a destination for hand-supplied job metrics
//! - Size expression parsing and formatting
//! - Showing which config file would be used

use clap::{Args, Parser, Subcommand};
use dtd_common::{
    format_size, format_value, parse_size_str, Diagnostic, Error, OutputFormat, RawValue, Severity,
    Size, StructuredError,
};
use dtd_config::load::read_config;
use dtd_config::resolve::CONFIG_FILENAME;
use dtd_config::{
    load_str, resolve_config_path, ConfigLocation, ConfigSnapshot, Mode, Validation,
};
use dtd_core::exit_codes::ExitCode;
use dtd_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use dtd_core::{parse_parameter, DecisionSource, MatchResult, Matcher, MetricsBundle};
use std::path::{Path, PathBuf};

/// Dynamic Tool Destination - route jobs to execution destinations by rule
#[derive(Parser)]
#[command(name = "dtd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (default: $DTD_CONFIG, then the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v shows config diagnostics, -vv traces)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a tool destination config
    Validate(ValidateArgs),

    /// Resolve the destination for a job
    Resolve(ResolveArgs),

    /// Parse or format size expressions
    Size(SizeArgs),

    /// Configuration discovery
    Config(ConfigArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Config file to validate (overrides --config)
    path: Option<PathBuf>,

    /// Report validity only; do not repair
    #[arg(long)]
    strict: bool,

    /// Print the repaired config
    #[arg(long)]
    emit: bool,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// Tool id as it appears in the config
    #[arg(long)]
    tool: String,

    /// Total input size (e.g. 52428800, "50 MB")
    #[arg(long, default_value = "0")]
    file_size: String,

    /// Total input record count
    #[arg(long, default_value_t = 0)]
    records: u64,

    /// Job parameter as name=value (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,
}

#[derive(Args, Debug)]
struct SizeArgs {
    #[command(subcommand)]
    command: SizeCommands,
}

#[derive(Subcommand, Debug)]
enum SizeCommands {
    /// Convert a size expression to bytes
    Parse {
        /// Size expression (e.g. "1 KB", "Infinity")
        expr: String,
    },
    /// Render a byte count
    Format {
        /// Byte count (-1 for unbounded)
        #[arg(allow_hyphen_values = true)]
        bytes: String,

        /// Largest unit to use
        #[arg(long, default_value = "YB")]
        unit: String,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show which config file would be used and why
    Path,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = LogLevel::from_flags(cli.global.verbose, cli.global.quiet);
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let exit_code = match &cli.command {
        Commands::Validate(args) => run_validate(&cli.global, args),
        Commands::Resolve(args) => run_resolve(&cli.global, args),
        Commands::Size(args) => run_size(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

/// Locate, read and validate the config.
fn load_config(
    cli_path: Option<&Path>,
    mode: Mode,
) -> Result<(ConfigLocation, String, Validation), Error> {
    let location = resolve_config_path(cli_path);
    let path = location.path.clone().ok_or_else(|| Error::ConfigNotFound {
        path: PathBuf::from(CONFIG_FILENAME),
    })?;
    let text = read_config(&path)?;
    let validation = load_str(&text, mode)?;
    Ok((location, text, validation))
}

fn run_validate(global: &GlobalOpts, args: &ValidateArgs) -> ExitCode {
    let mode = if args.strict {
        Mode::StrictCheckOnly
    } else {
        Mode::Repair
    };
    let cli_path = args.path.as_deref().or(global.config.as_deref());

    let (location, text, validation) = match load_config(cli_path, mode) {
        Ok(loaded) => loaded,
        Err(e) => return output_error(global, &e),
    };
    let snapshot = ConfigSnapshot::new(&location, &text, &validation);
    let verdict = if validation.valid {
        "Configuration is valid!"
    } else {
        "Errors detected; config not valid!"
    };

    // A strict-mode config is not authoritative, so it is never emitted.
    let emit = args.emit && mode == Mode::Repair;

    match global.format {
        OutputFormat::Json => {
            let mut response = serde_json::json!({
                "status": if validation.valid { "valid" } else { "invalid" },
                "message": verdict,
                "mode": if args.strict { "strict" } else { "repair" },
                "snapshot": snapshot,
                "diagnostics": validation.diagnostics,
            });
            if emit {
                response["config"] = match validation.config.to_json_value() {
                    Ok(config) => config,
                    Err(e) => return output_error(global, &e),
                };
            }
            print_json(&response);
        }
        OutputFormat::Summary => {
            let emitted = if emit {
                match validation.config.to_yaml_string() {
                    Ok(yaml) => Some(yaml),
                    Err(e) => return output_error(global, &e),
                }
            } else {
                None
            };
            println!("{}", verdict);
            for diag in &validation.diagnostics {
                println!("  {}", summary_line(diag));
            }
            println!(
                "  {} tool(s), {} rule(s) from {} ({})",
                snapshot.tool_count,
                snapshot.rule_count,
                snapshot.path.as_deref().unwrap_or("-"),
                snapshot.source
            );
            if let Some(yaml) = &emitted {
                println!("---");
                print!("{}", yaml);
            }
        }
        OutputFormat::Exitcode => {}
    }

    if validation.valid {
        ExitCode::Clean
    } else {
        ExitCode::ConfigInvalid
    }
}

fn summary_line(diag: &Diagnostic) -> String {
    let marker = match diag.severity {
        Severity::Error => "ERROR",
        Severity::Debug => "defect",
    };
    format!("{}: {}", marker, diag)
}

fn run_resolve(global: &GlobalOpts, args: &ResolveArgs) -> ExitCode {
    let metrics = match build_metrics(args) {
        Ok(metrics) => metrics,
        Err(e) => return output_error(global, &e),
    };

    let (_, _, validation) = match load_config(global.config.as_deref(), Mode::Repair) {
        Ok(loaded) => loaded,
        Err(e) => return output_error(global, &e),
    };

    let resolution = Matcher::new(&validation.config).evaluate(&args.tool, &metrics);

    match global.format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "tool": resolution.tool,
                "result": resolution.result,
                "source": resolution.source,
                "tool_known": resolution.tool_known,
                "config_valid": validation.valid,
                "metrics": metrics,
            }));
        }
        OutputFormat::Summary => {
            let source = match resolution.source {
                DecisionSource::Rule { index, kind } => format!("rule {} ({})", index, kind),
                DecisionSource::ToolDefault => "tool default".to_string(),
                DecisionSource::GlobalDefault => "global default".to_string(),
                DecisionSource::Unresolvable => "unresolvable".to_string(),
            };
            match &resolution.result {
                MatchResult::Destination(dest) => {
                    println!("{} -> {} [{}]", resolution.tool, dest, source)
                }
                MatchResult::Failure(message) => {
                    println!("{} refused: {} [{}]", resolution.tool, message, source)
                }
            }
        }
        OutputFormat::Exitcode => {}
    }

    if resolution.result.is_destination() {
        ExitCode::Clean
    } else {
        ExitCode::ResolutionFailed
    }
}

fn build_metrics(args: &ResolveArgs) -> Result<MetricsBundle, Error> {
    let invalid_size = |reason: &str| {
        Error::InvalidArgument(format!("--file-size {}: {}", args.file_size, reason))
    };
    let file_size = match parse_size_str(&args.file_size) {
        Ok(Size::Bytes(bytes)) => {
            u64::try_from(bytes).map_err(|_| invalid_size("does not fit in 64 bits"))?
        }
        Ok(Size::Unbounded) => return Err(invalid_size("must be finite")),
        Err(_) => return Err(invalid_size("not a size expression")),
    };

    let mut metrics = MetricsBundle::new()
        .with_file_size(file_size)
        .with_records(args.records);
    for param in &args.params {
        let (name, value) = parse_parameter(param)
            .map_err(|reason| Error::InvalidArgument(format!("--param {}", reason)))?;
        metrics = metrics.with_parameter(name, value);
    }
    Ok(metrics)
}

fn run_size(global: &GlobalOpts, args: &SizeArgs) -> ExitCode {
    match &args.command {
        SizeCommands::Parse { expr } => {
            let size = match parse_size_str(expr) {
                Ok(size) => size,
                Err(e) => return output_error(global, &e),
            };
            match global.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "expression": expr,
                    "bytes": bytes_json(size),
                    "unbounded": size.is_unbounded(),
                    "formatted": format_size(size, "YB"),
                })),
                OutputFormat::Summary => match size {
                    Size::Bytes(bytes) => println!("{}", bytes),
                    Size::Unbounded => println!("{}", Size::SENTINEL),
                },
                OutputFormat::Exitcode => {}
            }
            ExitCode::Clean
        }
        SizeCommands::Format { bytes, unit } => {
            let formatted = match format_value(&RawValue::from_scalar_str(bytes), unit) {
                Ok(formatted) => formatted,
                Err(e) => return output_error(global, &e),
            };
            match global.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "bytes": bytes,
                    "unit": unit,
                    "formatted": formatted,
                })),
                OutputFormat::Summary => println!("{}", formatted),
                OutputFormat::Exitcode => {}
            }
            ExitCode::Clean
        }
    }
}

/// Byte counts above `u64::MAX` are rendered as strings.
fn bytes_json(size: Size) -> serde_json::Value {
    match size {
        Size::Unbounded => serde_json::json!(Size::SENTINEL as i64),
        Size::Bytes(bytes) => match u64::try_from(bytes) {
            Ok(small) => serde_json::json!(small),
            Err(_) => serde_json::json!(bytes.to_string()),
        },
    }
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match args.command {
        ConfigCommands::Path => {
            let location = resolve_config_path(global.config.as_deref());
            let exists = location.path.as_ref().is_some_and(|p| p.exists());

            match global.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "path": location.path.as_ref().map(|p| p.display().to_string()),
                    "source": location.source,
                    "exists": exists,
                })),
                OutputFormat::Summary => match &location.path {
                    Some(path) if exists => println!("{} ({})", path.display(), location.source),
                    Some(path) => println!("{} ({}, missing)", path.display(), location.source),
                    None => println!("no config found"),
                },
                OutputFormat::Exitcode => {}
            }

            if exists {
                ExitCode::Clean
            } else {
                ExitCode::ConfigNotFound
            }
        }
    }
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "dtd_version": env!("CARGO_PKG_VERSION"),
        })),
        OutputFormat::Summary => println!("dtd {}", env!("CARGO_PKG_VERSION")),
        OutputFormat::Exitcode => {}
    }
}

// ============================================================================
// Output helpers
// ============================================================================

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}

fn output_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    tracing::error!(code = error.code(), "{}", error);

    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(error);
            let response = serde_json::json!({
                "status": "error",
                "error": structured,
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", structured.to_json()),
            }
        }
        OutputFormat::Summary => {
            eprintln!("error: {}", error);
            eprintln!("hint: {}", error.remediation());
        }
        OutputFormat::Exitcode => {}
    }

    ExitCode::from(error)
}

//! Logging System
//!
//! Structured logging using the `tracing` crate. Level, format, and
//! destination come from `LoggingConfig`, with `CATALOG_LOG*` environment
//! variables taking precedence.

use crate::config::xdg;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Resolve the log file path with precedence: CLI, CATALOG_LOG_FILE env, config file, default.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, CatalogError> {
    if let Some(p) = cli_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    if let Ok(env_path) = std::env::var("CATALOG_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    default_log_file_path()
}

/// Platform state directory, falling back to the XDG data directory where
/// the platform has no state directory.
fn default_log_file_path() -> Result<PathBuf, CatalogError> {
    let state_dir = directories::ProjectDirs::from("", "", xdg::APP_DIR)
        .and_then(|dirs| dirs.state_dir().map(|d| d.to_path_buf()));
    let dir = match state_dir {
        Some(dir) => dir,
        None => xdg::app_data_dir()?,
    };
    Ok(dir.join("catalog.log"))
}

/// `[logging]` section of `catalog.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `false` installs no subscriber at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base filter level; `off` silences everything
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_format")]
    pub format: String,

    /// `stdout`, `stderr`, `file`, `file+stderr` or `both`
    #[serde(default = "default_output")]
    pub output: String,

    /// Used when output includes a file; defaults to the platform state dir
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colours for text output to a terminal stream
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-target levels, e.g. `lesson_catalog::snapshot = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "file".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Install the global subscriber.
///
/// Highest precedence first:
/// 1. Environment variables (CATALOG_LOG, CATALOG_LOG_FORMAT, ...)
/// 2. The given config (CLI flags are folded into it by the caller)
/// 3. Defaults
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), CatalogError> {
    if config.map_or(false, |c| !c.enabled) {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let json = determine_format(config)? == "json";
    let output = determine_output(config)?;
    let use_color = config.map_or(true, |c| c.color) && !output.file;
    let writer = output.make_writer(config.and_then(|c| c.file.clone()))?;

    let base_subscriber = Registry::default().with(filter);
    let installed = if json {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init()
    };
    installed.map_err(|e| CatalogError::Config(format!("Failed to install log subscriber: {}", e)))
}

/// `CATALOG_LOG` wins outright; otherwise the config level plus module directives.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, CatalogError> {
    if let Ok(filter) = EnvFilter::try_from_env("CATALOG_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }
    let mut filter = EnvFilter::new(level);

    let mut directives: Vec<String> = config
        .map(|c| {
            c.modules
                .iter()
                .map(|(module, module_level)| format!("{}={}", module, module_level))
                .collect()
        })
        .unwrap_or_default();
    if let Ok(modules_str) = std::env::var("CATALOG_LOG_MODULES") {
        directives.extend(modules_str.split(',').filter_map(|entry| {
            let (module, level) = entry.split_once('=')?;
            Some(format!("{}={}", module.trim(), level.trim()))
        }));
    }
    for directive in directives {
        filter = filter.add_directive(directive.parse().map_err(|e| {
            CatalogError::Config(format!("Invalid log directive '{}': {}", directive, e))
        })?);
    }
    Ok(filter)
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, CatalogError> {
    if let Ok(format) = std::env::var("CATALOG_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(CatalogError::Config(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format.to_string())
}

/// Output destinations
#[derive(Debug, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

impl OutputDestinations {
    fn make_writer(&self, config_file: Option<PathBuf>) -> Result<BoxMakeWriter, CatalogError> {
        if !self.file {
            return Ok(match (self.stdout, self.stderr) {
                (true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
                (false, true) => BoxMakeWriter::new(std::io::stderr),
                _ => BoxMakeWriter::new(std::io::stdout),
            });
        }

        let log_file = resolve_log_file_path(None, config_file)?;
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CatalogError::Config(format!("Failed to create log directory: {}", e))
            })?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| {
                CatalogError::Config(format!("Failed to open log file {:?}: {}", log_file, e))
            })?;
        let file = Arc::new(file);
        Ok(if self.stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        })
    }
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<OutputDestinations, CatalogError> {
    if let Ok(output) = std::env::var("CATALOG_LOG_OUTPUT") {
        return parse_output_destinations(&output);
    }
    let output = config.map(|c| c.output.as_str()).unwrap_or("file");
    parse_output_destinations(output)
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, CatalogError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(CatalogError::Config(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations { stdout, stderr, file })
}

//! Configuration module for fetchall.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::coordinator::BatchOptions;
use crate::output::OutputFormat;
use crate::target::{Target, DEFAULT_SCHEME};
use crate::transport::DEFAULT_USER_AGENT;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "fetchall")]
#[command(version)]
#[command(about = "Fetch URLs in parallel and report their times and sizes", long_about = None)]
pub struct CliArgs {
    /// URLs to fetch
    #[arg(value_name = "URL")]
    pub targets: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in milliseconds (0 = no timeout)
    #[arg(short = 't', long)]
    pub timeout_ms: Option<u64>,

    /// Maximum requests in flight at once (0 = unbounded)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Scheme prefixed to URLs that have none
    #[arg(long)]
    pub scheme: Option<String>,

    /// Use URLs exactly as given
    #[arg(long)]
    pub no_default_scheme: bool,

    /// User-Agent header sent with each request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retrieval settings
#[derive(Debug, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in milliseconds, 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum requests in flight, 0 means unbounded
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Scheme prefixed to bare hosts; empty disables the rewrite
    #[serde(default = "default_scheme")]
    pub default_scheme: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            concurrency: default_concurrency(),
            default_scheme: default_scheme(),
            user_agent: default_user_agent(),
        }
    }
}

/// Output settings
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000 // 30 seconds
}

fn default_concurrency() -> usize {
    32
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub targets: Vec<String>,
    pub timeout: Option<Duration>,
    pub max_concurrency: Option<usize>,
    /// `None` leaves targets untouched
    pub default_scheme: Option<String>,
    pub user_agent: String,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Resolve parsed CLI args against the TOML file they name, if any.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents =
                std::fs::read_to_string(config_path).map_err(|source| ConfigError::FileRead {
                    path: config_path.clone(),
                    source,
                })?;
            toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
                path: config_path.clone(),
                source,
            })?
        } else {
            TomlConfig::default()
        };

        Ok(Self::merge(cli, toml_config))
    }

    /// Merge CLI args with TOML config (CLI takes precedence)
    pub fn merge(cli: CliArgs, toml_config: TomlConfig) -> Self {
        let timeout_ms = cli.timeout_ms.unwrap_or(toml_config.fetch.timeout_ms);
        let concurrency = cli.concurrency.unwrap_or(toml_config.fetch.concurrency);
        let scheme = cli.scheme.unwrap_or(toml_config.fetch.default_scheme);

        Config {
            targets: cli.targets,
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            max_concurrency: (concurrency > 0).then_some(concurrency),
            default_scheme: (!cli.no_default_scheme && !scheme.is_empty()).then_some(scheme),
            user_agent: cli.user_agent.unwrap_or(toml_config.fetch.user_agent),
            format: cli.format.unwrap_or(toml_config.output.format),
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            timeout: self.timeout,
            max_concurrency: self.max_concurrency,
        }
    }

    /// Targets as they will be submitted, with the default scheme applied.
    pub fn resolved_targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .map(|t| match &self.default_scheme {
                Some(scheme) => Target::with_default_scheme(t, scheme),
                None => Target::new(t.as_str()),
            })
            .collect()
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

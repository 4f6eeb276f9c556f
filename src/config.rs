//! Configuration module for the linecmd server.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::commands::{HandlerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_BUFFER_SIZE};
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default number of pending connections the listener queues.
pub const DEFAULT_BACKLOG: u32 = 5;

/// Command-line arguments for the server
#[derive(Parser, Debug, Default)]
#[command(name = "linecmd")]
#[command(version)]
#[command(about = "A single-session TCP server for newline-delimited commands", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum number of pending connections
    #[arg(long)]
    pub backlog: Option<u32>,

    /// Read chunk size in bytes (each receive asks for one byte less)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Close a connection once this many unterminated bytes are buffered
    #[arg(long)]
    pub max_buffer_size: Option<usize>,

    /// Deadline in seconds for each receive and send (disabled by default)
    #[arg(long)]
    pub io_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Listener configuration
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_backlog")]
    pub backlog: u32,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
        }
    }
}

/// Per-session configuration
#[derive(Debug, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
    pub io_timeout_secs: Option<u64>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_buffer_size: default_max_buffer_size(),
            io_timeout_secs: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backlog() -> u32 {
    DEFAULT_BACKLOG
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backlog: u32,
    pub chunk_size: usize,
    pub max_buffer_size: usize,
    pub io_timeout: Option<Duration>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::merge(CliArgs::default(), TomlConfig::default())
    }
}

impl Config {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Resolve configuration from already parsed arguments.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = match cli.config {
            Some(ref path) => {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
                        path: path.clone(),
                        source,
                    })?;
                toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
                    path: path.clone(),
                    source,
                })?
            }
            None => TomlConfig::default(),
        };

        let config = Self::merge(cli, toml_config);
        config.validate()?;
        Ok(config)
    }

    // CLI takes precedence
    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Self {
        Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port: cli.port.unwrap_or(toml_config.server.port),
            backlog: cli.backlog.unwrap_or(toml_config.server.backlog),
            chunk_size: cli.chunk_size.unwrap_or(toml_config.session.chunk_size),
            max_buffer_size: cli
                .max_buffer_size
                .unwrap_or(toml_config.session.max_buffer_size),
            io_timeout: cli
                .io_timeout
                .or(toml_config.session.io_timeout_secs)
                .map(Duration::from_secs),
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be at least 2, got {}",
                self.chunk_size
            )));
        }
        if self.backlog == 0 {
            return Err(ConfigError::Invalid("backlog must be at least 1".to_string()));
        }
        if self.max_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "max_buffer_size must be at least 1".to_string(),
            ));
        }
        if self.io_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "io_timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for the command handler.
    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            chunk_size: self.chunk_size,
            max_buffer_size: self.max_buffer_size,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:1234");
        assert_eq!(config.backlog, 5);
        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.max_buffer_size, 64 * 1024);
        assert_eq!(config.io_timeout, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            host = "0.0.0.0"
            port = 4000
            backlog = 16

            [session]
            chunk_size = 1024
            io_timeout_secs = 30

            [logging]
            level = "debug"
        "#;

        let toml_config: TomlConfig = toml::from_str(toml_str).unwrap();
        let config = Config::merge(CliArgs::default(), toml_config);
        assert_eq!(config.bind_address(), "0.0.0.0:4000");
        assert_eq!(config.backlog, 16);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.max_buffer_size, DEFAULT_MAX_BUFFER_SIZE);
        assert_eq!(config.io_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config: TomlConfig = toml::from_str("[server]\nport = 4000\n").unwrap();
        let cli = CliArgs::try_parse_from(["linecmd", "--port", "5000", "--log-level", "warn"])
            .unwrap();

        let config = Config::merge(cli, toml_config);
        assert_eq!(config.port, 5000);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<TomlConfig, _> = toml::from_str("[storage]\nmax_memory = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let cli = CliArgs::try_parse_from(["linecmd", "--chunk-size", "1"]).unwrap();
        assert!(matches!(Config::from_cli(cli), Err(ConfigError::Invalid(_))));

        let cli = CliArgs::try_parse_from(["linecmd", "--backlog", "0"]).unwrap();
        assert!(matches!(Config::from_cli(cli), Err(ConfigError::Invalid(_))));

        let cli = CliArgs::try_parse_from(["linecmd", "--io-timeout", "0"]).unwrap();
        assert!(matches!(Config::from_cli(cli), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = CliArgs::try_parse_from(["linecmd", "-c", "/nonexistent/linecmd.toml"]).unwrap();
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::FileRead { .. })
        ));
    }

    #[test]
    fn test_handler_config() {
        let config = Config {
            chunk_size: 16,
            max_buffer_size: 128,
            ..Config::default()
        };
        let handler = config.handler_config();
        assert_eq!(handler.chunk_size, 16);
        assert_eq!(handler.max_buffer_size, 128);
    }
}

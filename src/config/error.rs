use std::io::Error as IoError;
/// Error types for configuration module
use thiserror::Error;
use toml::de::Error as TomlDeError;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read configuration file: {0}")]
    FileReadError(#[from] IoError),

    /// Failed to parse configuration file
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] TomlDeError),

    /// Invalid environment variable value
    #[error("Invalid value for {var}: {value}")]
    InvalidEnvValue { var: &'static str, value: String },
}

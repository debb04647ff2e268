// src/error.rs

//! Unified error handling for the NOTAM map engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filter options could not be constructed
    #[error("Invalid filter option: {0}")]
    Filter(String),

    /// Dataset was produced for a schema this build does not read
    #[error("Dataset version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: String, expected: String },

    /// Dataset source failed for a country
    #[error("Source error for {country}: {message}")]
    Source { country: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a filter construction error.
    pub fn filter(message: impl Into<String>) -> Self {
        Self::Filter(message.into())
    }

    /// Create an unsupported version error.
    pub fn unsupported_version(found: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Create a source error with country context.
    pub fn source(country: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Source {
            country: country.into(),
            message: message.to_string(),
        }
    }
}

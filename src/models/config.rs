//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where per-country datasets come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Subject-code lookup tables
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    /// Overlay styling
    #[serde(default)]
    pub render: RenderConfig,

    /// Persisted UI preferences
    #[serde(default)]
    pub preferences: PreferencesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.root.trim().is_empty() {
            return Err(AppError::validation("source.root is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.render.icon_cache_capacity == 0 {
            return Err(AppError::validation(
                "render.icon_cache_capacity must be > 0",
            ));
        }
        if !(self.render.max_circle_radius_m > 0.0) {
            return Err(AppError::validation(
                "render.max_circle_radius_m must be > 0",
            ));
        }
        Ok(())
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Kind of dataset source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Local,
    Http,
}

/// Dataset source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Directory for `local`, base URL for `http`
    #[serde(default = "defaults::root")]
    pub root: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            root: defaults::root(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Lookup table location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaxonomyConfig {
    /// TOML file with `[first]`, `[second]` and optional `[[categories]]`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Overlay styling and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "defaults::cluster_color")]
    pub cluster_color: String,

    #[serde(default = "defaults::circle_color")]
    pub circle_color: String,

    #[serde(default = "defaults::circle_hover_color")]
    pub circle_hover_color: String,

    #[serde(default = "defaults::geometry_color")]
    pub geometry_color: String,

    /// Radius circles at or above this size are not drawn
    #[serde(default = "defaults::max_circle_radius")]
    pub max_circle_radius_m: f64,

    /// Number of badge icons kept in memory
    #[serde(default = "defaults::icon_cache_capacity")]
    pub icon_cache_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cluster_color: defaults::cluster_color(),
            circle_color: defaults::circle_color(),
            circle_hover_color: defaults::circle_hover_color(),
            geometry_color: defaults::geometry_color(),
            max_circle_radius_m: defaults::max_circle_radius(),
            icon_cache_capacity: defaults::icon_cache_capacity(),
        }
    }
}

/// Preference file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default = "defaults::preferences_path")]
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: defaults::preferences_path(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn root() -> String {
        "notamdata".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; notammap/0.1)".into()
    }

    // Render defaults
    pub fn cluster_color() -> String {
        "lightgray".into()
    }
    pub fn circle_color() -> String {
        "#0984e3".into()
    }
    pub fn circle_hover_color() -> String {
        "#00b894".into()
    }
    pub fn geometry_color() -> String {
        "#ff0000".into()
    }
    pub fn max_circle_radius() -> f64 {
        10_000.0
    }
    pub fn icon_cache_capacity() -> usize {
        64
    }

    pub fn preferences_path() -> PathBuf {
        PathBuf::from("data/preferences.json")
    }

    pub fn level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_root() {
        let mut config = Config::default();
        config.source.root = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_cache() {
        let mut config = Config::default();
        config.render.icon_cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_nan_radius() {
        let mut config = Config::default();
        config.render.max_circle_radius_m = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[source]
kind = "http"
root = "https://example.com/notamdata/"

[render]
max_circle_radius_m = 5000.0
"#,
        )
        .unwrap();

        assert_eq!(config.source.kind, SourceKind::Http);
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.render.max_circle_radius_m, 5000.0);
        assert_eq!(config.render.icon_cache_capacity, 64);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn bundled_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.render.cluster_color, "lightgray");
    }

    #[test]
    fn round_trips_through_toml() {
        let text = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.source.root, "notamdata");
    }
}

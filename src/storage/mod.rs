//! Dataset sources and the preference store.
//!
//! A source serves one JSON document per country plus a country index:
//!
//! ```text
//! {root}/
//! ├── countries.json        # ["Austria", "Czech Republic", ...]
//! ├── Austria.json          # Dataset
//! └── Czech_Republic.json   # spaces become underscores
//! ```

pub mod http;
pub mod local;
pub mod preferences;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Dataset, SourceConfig, SourceKind};

// Re-export for convenience
pub use http::HttpSource;
pub use local::LocalSource;
pub use preferences::Preferences;

/// Name of the country index document.
pub const COUNTRIES_FILE: &str = "countries.json";

/// Document name of a country's dataset.
pub fn dataset_file_name(country: &str) -> String {
    format!("{}.json", country.replace(' ', "_"))
}

/// Trait for per-country dataset backends.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Available countries, sorted.
    async fn countries(&self) -> Result<Vec<String>>;

    /// The dataset of one country. The version is not checked here.
    async fn dataset(&self, country: &str) -> Result<Dataset>;
}

/// Build the source described by the configuration.
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn DatasetSource>> {
    Ok(match config.kind {
        SourceKind::Local => Box::new(LocalSource::new(&config.root)),
        SourceKind::Http => Box::new(HttpSource::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_file_name() {
        assert_eq!(dataset_file_name("Austria"), "Austria.json");
        assert_eq!(dataset_file_name("Czech Republic"), "Czech_Republic.json");
        assert_eq!(
            dataset_file_name("Bosnia and Herzegovina"),
            "Bosnia_and_Herzegovina.json"
        );
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = SourceConfig {
            kind: SourceKind::Http,
            root: "not a url".to_string(),
            ..SourceConfig::default()
        };
        assert!(from_config(&config).is_err());
    }
}

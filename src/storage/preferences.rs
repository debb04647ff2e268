//! Persisted UI preferences.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::FilterOptions;
use crate::pipeline::MapPosition;

/// Selected country, filter options and last map position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub country: Option<String>,

    /// `None` until the user changes a filter; defaults come from the taxonomy
    #[serde(default)]
    pub filter: Option<FilterOptions>,

    #[serde(default)]
    pub position: MapPosition,
}

impl Preferences {
    /// Load preferences; a missing file yields defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        match tokio::fs::read(path.as_ref()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write atomically (write to temp, then rename).
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        log::debug!("Saved preferences to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Traffic;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let prefs = Preferences::load(tmp.path().join("nope.json")).await.unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("preferences.json");

        let mut filter = FilterOptions::with_codes(["OB", "W"]).unwrap();
        filter.traffic.set(Traffic::Ifr, false).unwrap();
        let prefs = Preferences {
            country: Some("Austria".to_string()),
            filter: Some(filter),
            position: MapPosition {
                latitude: 47.5,
                longitude: 14.0,
                zoom: 7,
            },
        };

        prefs.save(&path).await.unwrap();
        assert_eq!(Preferences::load(&path).await.unwrap(), prefs);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("preferences.json");
        tokio::fs::write(
            &path,
            r#"{ "filter": { "TRAFFIC": { "HELICOPTER": true }, "PURPOSE": {}, "SCOPE": {}, "QCODES": [] } }"#,
        )
        .await
        .unwrap();

        assert!(Preferences::load(&path).await.is_err());
    }
}

//! Local filesystem dataset source.
//!
//! Reads the documents written by the extractor straight from a directory,
//! for development and offline use.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::Dataset;
use crate::storage::{COUNTRIES_FILE, DatasetSource, dataset_file_name};

/// Dataset source rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root_dir: PathBuf,
}

impl LocalSource {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DatasetSource for LocalSource {
    async fn countries(&self) -> Result<Vec<String>> {
        let mut countries: Vec<String> = self
            .read_json(COUNTRIES_FILE)
            .await?
            .ok_or_else(|| {
                AppError::config(format!(
                    "{} not found in {}",
                    COUNTRIES_FILE,
                    self.root_dir.display()
                ))
            })?;
        countries.sort();
        Ok(countries)
    }

    async fn dataset(&self, country: &str) -> Result<Dataset> {
        let key = dataset_file_name(country);
        let bytes = self
            .read_bytes(&key)
            .await?
            .ok_or_else(|| AppError::source(country, format!("{key} not found")))?;

        let dataset = Dataset::from_json(&bytes)?;
        log::info!(
            "Loaded {} from {}: {} records, {} coordinates lists",
            country,
            self.path(&key).display(),
            dataset.notams.len(),
            dataset.coordinates_lists.len()
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_countries_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(COUNTRIES_FILE),
            r#"["Germany", "Austria", "Czech Republic"]"#,
        )
        .unwrap();

        let source = LocalSource::new(tmp.path());
        assert_eq!(
            source.countries().await.unwrap(),
            vec!["Austria", "Czech Republic", "Germany"]
        );
    }

    #[tokio::test]
    async fn test_missing_index_is_error() {
        let tmp = TempDir::new().unwrap();
        let source = LocalSource::new(tmp.path());
        assert!(source.countries().await.is_err());
    }

    #[tokio::test]
    async fn test_dataset_by_country_name() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("Czech_Republic.json"),
            r#"{ "version": "1.0", "notams": [], "coordinatesLists": [] }"#,
        )
        .unwrap();

        let source = LocalSource::new(tmp.path());
        let dataset = source.dataset("Czech Republic").await.unwrap();
        assert_eq!(dataset.version, "1.0");

        let err = source.dataset("Austria").await.unwrap_err();
        assert!(matches!(err, AppError::Source { .. }));
    }
}

//! HTTP dataset source.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Dataset, SourceConfig};
use crate::storage::{COUNTRIES_FILE, DatasetSource, dataset_file_name};

/// Dataset source served over HTTP(S) below a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    /// Create a configured asynchronous client for the base URL in `config.root`.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut root = config.root.trim().to_string();
        // without a trailing slash `join` would replace the last segment
        if !root.ends_with('/') {
            root.push('/');
        }
        let base = Url::parse(&root)?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, key: &str) -> Result<Url> {
        Ok(self.base.join(key)?)
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    async fn countries(&self) -> Result<Vec<String>> {
        let body = self.fetch(self.url(COUNTRIES_FILE)?).await?;
        let mut countries: Vec<String> = serde_json::from_slice(&body)?;
        countries.sort();
        Ok(countries)
    }

    async fn dataset(&self, country: &str) -> Result<Dataset> {
        let url = self.url(&dataset_file_name(country))?;
        let body = self
            .fetch(url.clone())
            .await
            .map_err(|e| AppError::source(country, e))?;

        let dataset = Dataset::from_json(&body)?;
        log::info!(
            "Loaded {} from {}: {} records, {} coordinates lists",
            country,
            url,
            dataset.notams.len(),
            dataset.coordinates_lists.len()
        );
        Ok(dataset)
    }
}

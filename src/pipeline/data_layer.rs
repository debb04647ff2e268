//! Application data layer.
//!
//! Holds the loaded dataset of the selected country and the filter options,
//! and keeps the displayed (filtered) dataset in step with both.

use crate::error::Result;
use crate::models::{Dataset, FilterOptions};
use crate::pipeline::filter_dataset;
use crate::storage::DatasetSource;

/// Result of selecting a country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { records: usize, geometry: usize },
    /// The dataset was not accepted; the previous one is still displayed
    Rejected { warning: String },
}

/// Country list, selection, loaded data and filter state.
#[derive(Debug, Clone)]
pub struct NotamDataLayer {
    countries: Vec<String>,
    country: Option<String>,
    loaded: Option<Dataset>,
    options: FilterOptions,
    displayed: Dataset,
}

impl NotamDataLayer {
    pub fn new(options: FilterOptions) -> Self {
        Self {
            countries: Vec::new(),
            country: None,
            loaded: None,
            options,
            displayed: Dataset::empty(),
        }
    }

    /// Fetch the country list from the source.
    pub async fn load_countries(&mut self, source: &dyn DatasetSource) -> Result<&[String]> {
        self.countries = source.countries().await?;
        log::info!("{} countries available", self.countries.len());
        Ok(&self.countries)
    }

    /// Load a country's dataset and display it under the current filter.
    ///
    /// A dataset with an unsupported version is rejected with a warning and
    /// the previous selection stays in place. Fetch failures are errors.
    pub async fn select_country(
        &mut self,
        source: &dyn DatasetSource,
        country: &str,
    ) -> Result<LoadOutcome> {
        let dataset = source.dataset(country).await?;

        if let Err(e) = dataset.ensure_supported() {
            let warning = format!("Notam data for {country}: {e}");
            log::warn!("{}", warning);
            return Ok(LoadOutcome::Rejected { warning });
        }

        let outcome = LoadOutcome::Loaded {
            records: dataset.notams.len(),
            geometry: dataset.coordinates_lists.len(),
        };
        self.country = Some(country.to_string());
        self.loaded = Some(dataset);
        self.refresh();
        Ok(outcome)
    }

    /// Replace the filter options and recompute the displayed data.
    pub fn set_filter_options(&mut self, options: FilterOptions) {
        self.options = options;
        self.refresh();
    }

    fn refresh(&mut self) {
        if let Some(loaded) = &self.loaded {
            self.displayed = filter_dataset(loaded, &self.options);
        }
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn loaded(&self) -> Option<&Dataset> {
        self.loaded.as_ref()
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// The filtered dataset; empty until a country is loaded.
    pub fn displayed(&self) -> &Dataset {
        &self.displayed
    }
}

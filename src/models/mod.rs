// src/models/mod.rs

//! Domain models for the NOTAM map engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod dataset;
mod filter;
mod notam;
mod taxonomy;

// Re-export all public types
pub use config::{
    Config, LoggingConfig, PreferencesConfig, RenderConfig, SourceConfig, SourceKind,
    TaxonomyConfig,
};
pub use dataset::{
    Coordinates, CoordinatesList, Dataset, DatasetReport, DetailedNotam, EMPTY_VERSION, Period,
    Reference, SUPPORTED_VERSION, TextNode,
};
pub use filter::{Category, CodePrefix, DateOptions, Flags, FilterOptions};
pub use notam::{NotamRecord, NotamType, PreviousNotam, Purpose, Scope, Traffic};
pub use taxonomy::{CodeCategory, Taxonomy};

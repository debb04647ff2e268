//! Dataset snapshot: detailed records plus shared geometry.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::NotamRecord;

/// The only dataset schema version this build reads.
pub const SUPPORTED_VERSION: &str = "1.0";

/// Version tag of the placeholder dataset shown before anything is loaded.
pub const EMPTY_VERSION: &str = "0.0";

/// Reference carried by a text node. At most one field is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,

    /// Hash of a coordinates list in the same dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates_list: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_link: Option<String>,

    /// Id of another record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notam_id: Option<i64>,
}

/// A fragment of a record's formatted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TextNode {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub reference: Option<Reference>,
}

impl TextNode {
    /// Plain text without a reference.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference: None,
        }
    }

    /// Text node pointing at a coordinates list.
    pub fn coordinates(text: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference: Some(Reference {
                coordinates_list: Some(hash.into()),
                ..Reference::default()
            }),
        }
    }

    /// Hash of the referenced coordinates list, if any.
    pub fn coordinates_hash(&self) -> Option<&str> {
        self.reference
            .as_ref()
            .and_then(|r| r.coordinates_list.as_deref())
    }
}

/// A period in which a record is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    /// Start relative to sunrise, in minutes
    #[serde(default)]
    pub sunrise_offset: Option<i32>,
    /// End relative to sunset, in minutes
    #[serde(default)]
    pub sunset_offset: Option<i32>,
}

/// A record together with its text nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetailedNotam {
    pub notam: NotamRecord,

    /// Unique within one dataset
    pub id: i64,

    #[serde(default)]
    pub previous_notam_id: Option<i64>,

    #[serde(default)]
    pub text_nodes: Vec<TextNode>,

    #[serde(default)]
    pub active_periods: Option<Vec<Period>>,
}

impl DetailedNotam {
    /// Hashes of every coordinates list referenced by this record's text.
    pub fn coordinates_hashes(&self) -> impl Iterator<Item = &str> {
        self.text_nodes.iter().filter_map(TextNode::coordinates_hash)
    }
}

/// A single point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Geometry extracted from record text, shared by hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoordinatesList {
    pub hash: String,
    pub coordinates: Vec<Coordinates>,
}

impl CoordinatesList {
    /// Build a list whose hash is derived from its content.
    ///
    /// Datasets read from a source keep the hash the extractor assigned; this
    /// constructor is for producers assembling a dataset in process, so that
    /// equal geometry from different records collapses to one shared entry.
    pub fn new(coordinates: Vec<Coordinates>) -> Self {
        let hash = Self::content_hash(&coordinates);
        Self { hash, coordinates }
    }

    /// Hex encoded SHA-256 over the ordered coordinate pairs.
    pub fn content_hash(coordinates: &[Coordinates]) -> String {
        let mut hasher = Sha256::new();
        for c in coordinates {
            hasher.update(c.latitude.to_be_bytes());
            hasher.update(c.longitude.to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// A single coordinate describes a point rather than an area.
    pub fn is_point(&self) -> bool {
        self.coordinates.len() == 1
    }
}

/// Immutable snapshot of one country's notices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub version: String,

    #[serde(default)]
    pub notams: Vec<DetailedNotam>,

    #[serde(default)]
    pub coordinates_lists: Vec<CoordinatesList>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dataset {
    /// Placeholder dataset with no records.
    pub fn empty() -> Self {
        Self {
            version: EMPTY_VERSION.to_string(),
            notams: Vec::new(),
            coordinates_lists: Vec::new(),
        }
    }

    /// Parse a dataset document.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Reject documents written for another schema version.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.version == SUPPORTED_VERSION {
            Ok(())
        } else {
            Err(AppError::unsupported_version(
                &self.version,
                SUPPORTED_VERSION,
            ))
        }
    }

    /// Look up a coordinates list by hash.
    pub fn coordinates_list(&self, hash: &str) -> Option<&CoordinatesList> {
        self.coordinates_lists.iter().find(|cl| cl.hash == hash)
    }

    /// Every coordinates hash referenced by any record's text.
    pub fn referenced_hashes(&self) -> HashSet<&str> {
        self.notams
            .iter()
            .flat_map(DetailedNotam::coordinates_hashes)
            .collect()
    }

    /// Check the snapshot for integrity problems.
    pub fn validate(&self) -> DatasetReport {
        let known: HashSet<&str> = self
            .coordinates_lists
            .iter()
            .map(|cl| cl.hash.as_str())
            .collect();

        let mut seen: HashMap<i64, usize> = HashMap::new();
        let mut report = DatasetReport {
            record_count: self.notams.len(),
            geometry_count: self.coordinates_lists.len(),
            ..DatasetReport::default()
        };

        for detailed in &self.notams {
            *seen.entry(detailed.id).or_default() += 1;

            if !SUBJECT_CODE.is_match(&detailed.notam.notam_code) {
                report.malformed_codes.push(detailed.id);
            }
            if detailed.notam.latitude.is_none() || detailed.notam.longitude.is_none() {
                report.missing_position.push(detailed.id);
            }
            report.dangling_references += detailed
                .coordinates_hashes()
                .filter(|hash| !known.contains(hash))
                .count();
        }

        report.duplicate_ids = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect();
        report.duplicate_ids.sort_unstable();

        let referenced = self.referenced_hashes();
        report.orphaned_geometry = self
            .coordinates_lists
            .iter()
            .filter(|cl| !referenced.contains(cl.hash.as_str()))
            .count();

        report
    }
}

/// `Q` followed by four letters, optionally followed by free text.
static SUBJECT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q[A-Z]{4}( .*)?$").expect("valid subject code pattern"));

/// Result of [`Dataset::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetReport {
    pub record_count: usize,
    pub geometry_count: usize,
    /// Ids that occur more than once
    pub duplicate_ids: Vec<i64>,
    /// Records whose subject code is not `Q` + four letters
    pub malformed_codes: Vec<i64>,
    /// Records that will be grouped at the origin
    pub missing_position: Vec<i64>,
    /// Text node references naming an absent hash
    pub dangling_references: usize,
    /// Coordinates lists no record refers to
    pub orphaned_geometry: usize,
}

impl DatasetReport {
    /// Duplicate ids break record identity; everything else is a warning.
    pub fn is_valid(&self) -> bool {
        self.duplicate_ids.is_empty()
    }
}

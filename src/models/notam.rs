//! NOTAM record data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The notice type (`NOTAMN`, `NOTAMR`, `NOTAMC`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotamType {
    New,
    Replace,
    Cancel,
}

/// Affected traffic as provided in item Q.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Traffic {
    Ifr,
    Vfr,
    Checklist,
}

/// Notice purpose as provided in item Q.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Purpose {
    ImmediateAttention,
    Bulletin,
    Operations,
    Miscellaneous,
    Checklist,
}

/// Notice scope as provided in item Q.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Aerodrome,
    Enroute,
    NavWarning,
    Checklist,
}

/// Identifiers of the record a REPLACE or CANCEL notice refers to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PreviousNotam {
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// A single parsed notice.
///
/// Field names follow the extractor's JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotamRecord {
    /// Raw notice text
    #[serde(default)]
    pub raw: String,

    /// Series letter in front of the number (e.g. `A` for A0001)
    #[serde(default)]
    pub series: Option<String>,

    /// Number unique to the series
    #[serde(default)]
    pub number: Option<u32>,

    /// Full four digit year
    #[serde(default)]
    pub year: Option<i32>,

    #[serde(rename = "type", default)]
    pub notam_type: Option<NotamType>,

    /// Only present for REPLACE and CANCEL
    #[serde(default)]
    pub previous_notam: Option<PreviousNotam>,

    /// Flight information region from item Q
    #[serde(default)]
    pub fir: String,

    /// Five letter subject code, optionally followed by free text
    #[serde(default)]
    pub notam_code: String,

    #[serde(default)]
    pub traffic: Vec<Traffic>,

    #[serde(default)]
    pub purposes: Vec<Purpose>,

    #[serde(default)]
    pub scopes: Vec<Scope>,

    /// Lower limit in flight levels, 0 when unspecified
    #[serde(default)]
    pub q_lower: Option<u32>,

    /// Upper limit in flight levels, 999 when unspecified
    #[serde(default)]
    pub q_upper: Option<u32>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    /// Radius in nautical miles
    #[serde(default)]
    pub radius: Option<u32>,

    #[serde(default)]
    pub location_indicators: Vec<String>,

    /// Item B (UTC, ISO 8601)
    #[serde(default)]
    pub from: Option<String>,

    /// Item C (UTC, ISO 8601), absent when permanent
    #[serde(default)]
    pub to: Option<String>,

    #[serde(default)]
    pub is_permanent: bool,

    #[serde(default)]
    pub is_estimation: bool,

    /// Item D
    #[serde(default)]
    pub schedule: Option<String>,

    /// Item E
    #[serde(default)]
    pub notam_text: String,

    /// Item F
    #[serde(default)]
    pub lower_limit: Option<String>,

    /// Item G
    #[serde(default)]
    pub upper_limit: Option<String>,

    #[serde(default)]
    pub created: Option<String>,

    #[serde(default)]
    pub source: Option<String>,
}

impl NotamRecord {
    /// Parsed start of validity, if present and well formed.
    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.from.as_deref().and_then(parse_timestamp)
    }

    /// Parsed end of validity, if present and well formed.
    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.to.as_deref().and_then(parse_timestamp)
    }

    /// Whether item Q carries explicit vertical limits (not 0/999).
    pub fn has_specific_height(&self) -> bool {
        !(self.q_lower.unwrap_or(0) == 0 && self.q_upper.unwrap_or(999) == 999)
    }

    /// Whether the subject code marks a checklist or catch-all notice.
    ///
    /// Such records are governed by the scope test only.
    pub fn is_checklist_or_catch_all(&self) -> bool {
        matches!(self.notam_code.chars().nth(2), Some('K') | Some('X'))
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            // Extractor output sometimes omits the offset
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
                .map(|naive| naive.and_utc())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_extractor_record() {
        let json = r#"{
            "series": "A",
            "number": 1234,
            "year": 2024,
            "type": "REPLACE",
            "previousNotam": { "series": "A", "number": 1000, "year": 2024 },
            "fir": "LOVV",
            "notamCode": "QOBCE",
            "traffic": ["IFR", "VFR"],
            "purposes": ["MISCELLANEOUS"],
            "scopes": ["AERODROME", "ENROUTE"],
            "qLower": 0,
            "qUpper": 999,
            "latitude": 48.2,
            "longitude": 16.4,
            "radius": 5,
            "locationIndicators": ["LOWW"],
            "from": "2024-03-01T06:00:00Z",
            "isPermanent": true,
            "isEstimation": false,
            "notamText": "CRANE ERECTED"
        }"#;

        let record: NotamRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.notam_type, Some(NotamType::Replace));
        assert_eq!(record.traffic, vec![Traffic::Ifr, Traffic::Vfr]);
        assert_eq!(record.scopes, vec![Scope::Aerodrome, Scope::Enroute]);
        assert_eq!(record.previous_notam.as_ref().unwrap().number, Some(1000));
        assert!(record.is_permanent);
        assert!(record.to.is_none());
        assert!(record.valid_from().is_some());
    }

    #[test]
    fn test_specific_height() {
        let mut record = NotamRecord {
            q_lower: Some(0),
            q_upper: Some(999),
            ..Default::default()
        };
        assert!(!record.has_specific_height());

        record.q_upper = Some(65);
        assert!(record.has_specific_height());
    }

    #[test]
    fn test_checklist_marker() {
        let mut record = NotamRecord {
            notam_code: "QKKKK".to_string(),
            ..Default::default()
        };
        assert!(record.is_checklist_or_catch_all());

        record.notam_code = "QOBXX".to_string();
        assert!(!record.is_checklist_or_catch_all());

        record.notam_code = "QXXXX".to_string();
        assert!(record.is_checklist_or_catch_all());

        record.notam_code = "Q".to_string();
        assert!(!record.is_checklist_or_catch_all());
    }

    #[test]
    fn test_naive_timestamp() {
        let record = NotamRecord {
            to: Some("2024-03-01T06:00:00".to_string()),
            ..Default::default()
        };
        assert!(record.valid_to().is_some());
    }
}

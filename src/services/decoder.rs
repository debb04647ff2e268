// src/services/decoder.rs

//! Subject-code decoder.
//!
//! Turns a five letter subject code such as `QOBCE` into text such as
//! `Obstacle erected`. Never fails: unknown segments degrade to a placeholder.

use std::sync::Arc;

use crate::models::Taxonomy;

/// Label used for the two checklist codes.
pub const CHECKLIST_LABEL: &str = "Checklist";

/// Codes that denote a checklist notice.
const CHECKLIST_CODES: [&str; 2] = ["QKKKK", "QKKXX"];

/// Second segment meaning "see free text".
const CATCH_ALL: &str = "XX";

/// Second segment of a trigger notice.
const TRIGGER: &str = "TT";
const TRIGGER_TEXT: &str = "trigger NOTAM (AIP changes)";

/// Decoder bound to a set of lookup tables.
#[derive(Debug, Clone)]
pub struct SubjectDecoder {
    taxonomy: Arc<Taxonomy>,
}

impl Default for SubjectDecoder {
    fn default() -> Self {
        Self::new(Arc::new(Taxonomy::default()))
    }
}

impl SubjectDecoder {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Decode a subject code, optionally followed by a space and free text.
    pub fn decode(&self, code: &str) -> String {
        if CHECKLIST_CODES.contains(&code) {
            return CHECKLIST_LABEL.to_string();
        }

        let first = segment(code, 1);
        let second = segment(code, 3);

        let subject = self
            .taxonomy
            .subject(first)
            .map(str::to_string)
            .unwrap_or_else(|| unknown(first));

        let condition = match second {
            CATCH_ALL => free_text(code).unwrap_or_default().to_string(),
            TRIGGER => TRIGGER_TEXT.to_string(),
            _ => self
                .taxonomy
                .condition(second)
                .map(str::to_string)
                .unwrap_or_else(|| unknown(second)),
        };

        format!("{} {}", subject, lowercase_first(&condition))
            .trim()
            .to_string()
    }
}

/// Two characters starting at `start`; shorter (or empty) near the end.
fn segment(code: &str, start: usize) -> &str {
    let begin = code
        .char_indices()
        .nth(start)
        .map(|(i, _)| i)
        .unwrap_or(code.len());
    let end = code
        .char_indices()
        .nth(start + 2)
        .map(|(i, _)| i)
        .unwrap_or(code.len());
    &code[begin..end]
}

/// Text after the first space, if the input is longer than the bare code.
fn free_text(code: &str) -> Option<&str> {
    if code.chars().count() <= 5 {
        return None;
    }
    code.split_once(' ')
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
}

fn unknown(segment: &str) -> String {
    format!("('{segment}' unknown)")
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> SubjectDecoder {
        SubjectDecoder::default()
    }

    #[test]
    fn test_checklist_literals() {
        assert_eq!(decoder().decode("QKKKK"), "Checklist");
        assert_eq!(decoder().decode("QKKXX"), "Checklist");
    }

    #[test]
    fn test_known_code() {
        assert_eq!(decoder().decode("QOBCE"), "Obstacle erected");
        assert_eq!(decoder().decode("QMRLC"), "Runway closed");
    }

    #[test]
    fn test_unknown_segments() {
        let text = decoder().decode("QZZCE");
        assert!(text.contains("('ZZ' unknown)"));
        assert_eq!(text, "('ZZ' unknown) erected");

        // placeholder starts with '(' so lowercasing leaves it intact
        assert_eq!(decoder().decode("QOBQQ"), "Obstacle ('QQ' unknown)");
    }

    #[test]
    fn test_catch_all_with_free_text() {
        assert_eq!(
            decoder().decode("QOBXX Wind turbines"),
            "Obstacle wind turbines"
        );
        assert_eq!(decoder().decode("QOBXX"), "Obstacle");
    }

    #[test]
    fn test_trigger() {
        assert_eq!(
            decoder().decode("QFATT"),
            "Aerodrome trigger NOTAM (AIP changes)"
        );
    }

    #[test]
    fn test_malformed_input_degrades() {
        assert_eq!(decoder().decode(""), "('' unknown) ('' unknown)");
        assert_eq!(decoder().decode("Q"), "('' unknown) ('' unknown)");
        assert_eq!(decoder().decode("QO"), "('O' unknown) ('' unknown)");
        // multi-byte input must not panic
        assert!(decoder().decode("QÄÖÜß").contains("unknown"));
    }

    #[test]
    fn test_custom_tables() {
        let mut taxonomy = Taxonomy::default();
        taxonomy
            .first
            .insert("OB".to_string(), "Obstacle lighting".to_string());
        let decoder = SubjectDecoder::new(Arc::new(taxonomy));
        assert_eq!(decoder.decode("QOBAS"), "Obstacle lighting unserviceable");
    }
}

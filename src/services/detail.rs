// src/services/detail.rs

//! Detail view state for an activated cluster.

use std::collections::HashMap;
use std::fmt;

use crate::models::DetailedNotam;
use crate::services::SubjectDecoder;

/// Cyclic, index based browser over the records of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterDetail {
    records: Vec<DetailedNotam>,
    index: usize,
}

impl ClusterDetail {
    /// Returns `None` for an empty record list.
    pub fn new(records: Vec<DetailedNotam>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        Some(Self { records, index: 0 })
    }

    pub fn current(&self) -> &DetailedNotam {
        &self.records[self.index]
    }

    /// Advance, wrapping from the last record to the first.
    pub fn next(&mut self) -> &DetailedNotam {
        self.index = (self.index + 1) % self.records.len();
        self.current()
    }

    /// Step back, wrapping from the first record to the last.
    pub fn previous(&mut self) -> &DetailedNotam {
        self.index = self
            .index
            .checked_sub(1)
            .unwrap_or(self.records.len() - 1);
        self.current()
    }

    /// One based position and total, e.g. `(2, 5)`.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Previous/next controls are only shown for more than one record.
    pub fn has_navigation(&self) -> bool {
        self.records.len() > 1
    }

    pub fn records(&self) -> &[DetailedNotam] {
        &self.records
    }
}

/// One decoded subject with the number of records carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub text: String,
    pub count: usize,
}

impl fmt::Display for LabelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count > 1 {
            write!(f, "{} (\u{00D7}{})", self.text, self.count)
        } else {
            f.write_str(&self.text)
        }
    }
}

/// Display label of a cluster: decoded subjects in first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterLabel {
    pub entries: Vec<LabelEntry>,
}

impl ClusterLabel {
    /// Decode each distinct subject code once and count repeats.
    pub fn build(records: &[DetailedNotam], decoder: &SubjectDecoder) -> Self {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<LabelEntry> = Vec::new();

        for record in records {
            let code = record.notam.notam_code.as_str();
            match slots.get(code) {
                Some(&slot) => entries[slot].count += 1,
                None => {
                    slots.insert(code, entries.len());
                    entries.push(LabelEntry {
                        text: decoder.decode(code),
                        count: 1,
                    });
                }
            }
        }

        Self { entries }
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotamRecord;

    fn record(id: i64, code: &str) -> DetailedNotam {
        DetailedNotam {
            notam: NotamRecord {
                notam_code: code.to_string(),
                ..Default::default()
            },
            id,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_cluster_has_no_detail() {
        assert!(ClusterDetail::new(Vec::new()).is_none());
    }

    #[test]
    fn test_cyclic_navigation() {
        let mut detail =
            ClusterDetail::new(vec![record(1, "QOBCE"), record(2, "QOBCE"), record(3, "QMRLC")])
                .unwrap();
        assert_eq!(detail.position(), (1, 3));

        assert_eq!(detail.previous().id, 3);
        assert_eq!(detail.position(), (3, 3));

        assert_eq!(detail.next().id, 1);
        assert_eq!(detail.next().id, 2);
        assert_eq!(detail.position(), (2, 3));
    }

    #[test]
    fn test_single_record_navigation() {
        let mut detail = ClusterDetail::new(vec![record(9, "QOBCE")]).unwrap();
        assert!(!detail.has_navigation());
        assert_eq!(detail.next().id, 9);
        assert_eq!(detail.previous().id, 9);
    }

    #[test]
    fn test_label_counts_repeats() {
        let records = vec![
            record(1, "QOBCE"),
            record(2, "QMRLC"),
            record(3, "QOBCE"),
            record(4, "QOBCE"),
        ];
        let label = ClusterLabel::build(&records, &SubjectDecoder::default());

        assert_eq!(label.entries.len(), 2);
        assert_eq!(label.entries[0].count, 3);
        assert_eq!(
            label.to_string(),
            "Obstacle erected (\u{00D7}3), Runway closed"
        );
    }
}

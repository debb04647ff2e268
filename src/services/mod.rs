//! Service layer for presenting records.
//!
//! - Subject-code decoding (`SubjectDecoder`)
//! - Display formatting of records (`format`)
//! - Cluster detail browsing and labels (`ClusterDetail`, `ClusterLabel`)

mod decoder;
mod detail;
pub mod format;

pub use decoder::{CHECKLIST_LABEL, SubjectDecoder};
pub use detail::{ClusterDetail, ClusterLabel, LabelEntry};

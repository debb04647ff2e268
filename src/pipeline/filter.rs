//! Filter predicate builder and dataset filter.
//!
//! The predicate rejects a record on the first failing test, in this order:
//! traffic, purpose, scope, subject code. The dataset filter then drops every
//! coordinates list no surviving record refers to.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::models::{Dataset, DetailedNotam, FilterOptions};

/// A compiled predicate; `true` means the record is displayed.
#[derive(Clone)]
pub struct NotamFilter {
    predicate: Arc<dyn Fn(&DetailedNotam) -> bool + Send + Sync>,
}

impl NotamFilter {
    /// Wrap an arbitrary predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&DetailedNotam) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Compile filter options into a predicate.
    ///
    /// The DATE group is not consulted.
    pub fn from_options(options: &FilterOptions) -> Self {
        let options = options.clone();
        Self::new(move |detailed| {
            let notam = &detailed.notam;

            if !options.traffic.any_match(&notam.traffic) {
                log::trace!("No match: traffic ({})", detailed.id);
                return false;
            }
            if !options.purpose.any_match(&notam.purposes) {
                log::trace!("No match: purpose ({})", detailed.id);
                return false;
            }
            if !options.scope.any_match(&notam.scopes) {
                log::trace!("No match: scope ({})", detailed.id);
                return false;
            }

            // Checklist and catch-all codes are governed by scope only
            if !notam.is_checklist_or_catch_all()
                && !options.code_enabled(category_segment(&notam.notam_code))
            {
                log::trace!("No match: subject code ({})", detailed.id);
                return false;
            }

            true
        })
    }

    pub fn matches(&self, detailed: &DetailedNotam) -> bool {
        (self.predicate)(detailed)
    }
}

impl fmt::Debug for NotamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotamFilter").finish_non_exhaustive()
    }
}

impl From<&FilterOptions> for NotamFilter {
    fn from(options: &FilterOptions) -> Self {
        Self::from_options(options)
    }
}

impl From<FilterOptions> for NotamFilter {
    fn from(options: FilterOptions) -> Self {
        Self::from_options(&options)
    }
}

impl From<&NotamFilter> for NotamFilter {
    fn from(filter: &NotamFilter) -> Self {
        filter.clone()
    }
}

/// The 2-letter category segment (characters 2 and 3) of a subject code.
fn category_segment(code: &str) -> &str {
    let mut indices = code.char_indices().map(|(i, _)| i).chain([code.len()]);
    let start = indices.nth(1).unwrap_or(code.len());
    let end = indices.nth(1).unwrap_or(code.len());
    &code[start..end]
}

/// Filter a dataset with a compiled predicate or raw options.
///
/// Returns a new snapshot; the input is not modified. Coordinates lists keep
/// their input order and only those referenced by a surviving record remain.
pub fn filter_dataset(dataset: &Dataset, filter: impl Into<NotamFilter>) -> Dataset {
    let filter = filter.into();

    let notams: Vec<DetailedNotam> = dataset
        .notams
        .iter()
        .filter(|n| filter.matches(n))
        .cloned()
        .collect();

    let referenced: HashSet<&str> = notams
        .iter()
        .flat_map(DetailedNotam::coordinates_hashes)
        .collect();

    let coordinates_lists = dataset
        .coordinates_lists
        .iter()
        .filter(|cl| referenced.contains(cl.hash.as_str()))
        .cloned()
        .collect::<Vec<_>>();

    log::debug!(
        "Filtered {}/{} records, {}/{} coordinates lists",
        notams.len(),
        dataset.notams.len(),
        coordinates_lists.len(),
        dataset.coordinates_lists.len()
    );

    Dataset {
        version: dataset.version.clone(),
        notams,
        coordinates_lists,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Coordinates, CoordinatesList, Flags, NotamRecord, Purpose, Scope, SUPPORTED_VERSION,
        TextNode, Traffic,
    };

    fn record(id: i64, code: &str) -> DetailedNotam {
        DetailedNotam {
            notam: NotamRecord {
                notam_code: code.to_string(),
                traffic: vec![Traffic::Ifr, Traffic::Vfr],
                purposes: vec![Purpose::Bulletin, Purpose::Operations],
                scopes: vec![Scope::Aerodrome],
                ..Default::default()
            },
            id,
            ..Default::default()
        }
    }

    fn geometry(hash: &str) -> CoordinatesList {
        CoordinatesList {
            hash: hash.to_string(),
            coordinates: vec![Coordinates {
                latitude: 48.0,
                longitude: 16.0,
            }],
        }
    }

    fn all_codes() -> FilterOptions {
        FilterOptions::with_codes(["OB", "OL", "RD", "RR", "MR", "W"]).unwrap()
    }

    fn sample_dataset() -> Dataset {
        let mut obstacle = record(1, "QOBCE");
        obstacle.text_nodes = vec![TextNode::coordinates("pos", "h1")];

        let mut danger = record(2, "QRDCA");
        danger.text_nodes = vec![
            TextNode::coordinates("area", "h2"),
            TextNode::coordinates("again", "h1"),
        ];

        let mut runway = record(3, "QMRLC");
        runway.text_nodes = vec![TextNode::coordinates("rwy", "h3")];

        Dataset {
            version: SUPPORTED_VERSION.to_string(),
            notams: vec![obstacle, danger, runway],
            coordinates_lists: vec![
                geometry("h1"),
                geometry("h2"),
                geometry("h3"),
                geometry("orphan"),
            ],
        }
    }

    #[test]
    fn test_category_segment() {
        assert_eq!(category_segment("QOBCE"), "OB");
        assert_eq!(category_segment("QO"), "O");
        assert_eq!(category_segment(""), "");
    }

    #[test]
    fn test_traffic_test() {
        let mut options = all_codes();
        options.traffic = Flags::none().with(Traffic::Vfr, true).unwrap();
        let filter = NotamFilter::from(&options);

        let mut ifr_only = record(1, "QOBCE");
        ifr_only.notam.traffic = vec![Traffic::Ifr];
        assert!(!filter.matches(&ifr_only));

        let mut vfr_only = record(2, "QOBCE");
        vfr_only.notam.traffic = vec![Traffic::Vfr];
        assert!(filter.matches(&vfr_only));
    }

    #[test]
    fn test_empty_category_list_never_passes() {
        let filter = NotamFilter::from(&all_codes());
        let mut unclassified = record(1, "QOBCE");
        unclassified.notam.purposes.clear();
        assert!(!filter.matches(&unclassified));
    }

    #[test]
    fn test_any_match_boundaries() {
        let mut none = all_codes();
        none.scope = Flags::none();
        let reject_all = NotamFilter::from(&none);

        for scopes in [vec![Scope::Aerodrome], vec![Scope::Enroute, Scope::NavWarning]] {
            let mut r = record(1, "QOBCE");
            r.notam.scopes = scopes;
            assert!(!reject_all.matches(&r));

            let accept_all = NotamFilter::from(&all_codes());
            assert!(accept_all.matches(&r));
        }
    }

    #[test]
    fn test_checklist_governed_by_scope_only() {
        let mut checklist = record(1, "QKKKK");
        checklist.notam.traffic = vec![Traffic::Checklist];
        checklist.notam.purposes = vec![Purpose::Checklist];
        checklist.notam.scopes = vec![Scope::Checklist];

        // no subject prefixes and no selectable traffic/purpose enabled
        let mut options = FilterOptions::with_codes(Vec::<String>::new()).unwrap();
        options.traffic = Flags::none();
        options.purpose = Flags::none();
        assert!(NotamFilter::from(&options).matches(&checklist));

        options.scope = Flags::none().with(Scope::Aerodrome, true).unwrap();
        assert!(!NotamFilter::from(&options).matches(&checklist));
    }

    #[test]
    fn test_subject_code_prefixes() {
        let options = FilterOptions::with_codes(["W", "OB"]).unwrap();
        let filter = NotamFilter::from(&options);

        assert!(filter.matches(&record(1, "QOBCE")));
        assert!(filter.matches(&record(2, "QWULW")));
        assert!(!filter.matches(&record(3, "QOLAS")));
        assert!(!filter.matches(&record(4, "QMRLC")));
        // catch-all codes skip the subject test
        assert!(filter.matches(&record(5, "QMXXX")));
    }

    #[test]
    fn test_date_group_is_not_consulted() {
        let mut options = all_codes();
        options.date.days = 0;
        options.date.from = "2000-01-01".to_string();
        options.date.to = "2000-01-02".to_string();
        assert!(NotamFilter::from(&options).matches(&record(1, "QOBCE")));
    }

    #[test]
    fn test_filter_collects_unreferenced_geometry() {
        let dataset = sample_dataset();
        let options = FilterOptions::with_codes(["OB", "MR"]).unwrap();

        let filtered = filter_dataset(&dataset, &options);
        let ids: Vec<_> = filtered.notams.iter().map(|n| n.id).collect();
        let hashes: Vec<_> = filtered.coordinates_lists.iter().map(|c| c.hash.as_str()).collect();

        assert_eq!(ids, vec![1, 3]);
        assert_eq!(hashes, vec!["h1", "h3"]);
        // input untouched
        assert_eq!(dataset.notams.len(), 3);
        assert_eq!(dataset.coordinates_lists.len(), 4);
    }

    #[test]
    fn test_no_orphans_after_filter() {
        let dataset = sample_dataset();
        for codes in [vec!["OB"], vec!["RD"], vec!["MR", "RD"], vec![]] {
            let options = FilterOptions::with_codes(codes).unwrap();
            let filtered = filter_dataset(&dataset, &options);
            let referenced = filtered.referenced_hashes();
            for cl in &filtered.coordinates_lists {
                assert!(referenced.contains(cl.hash.as_str()));
                assert!(dataset.coordinates_list(&cl.hash).is_some());
            }
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let dataset = sample_dataset();
        let filter = NotamFilter::from(&FilterOptions::with_codes(["RD"]).unwrap());

        let once = filter_dataset(&dataset, &filter);
        let twice = filter_dataset(&once, &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_accepts_custom_predicate() {
        let dataset = sample_dataset();
        let filtered = filter_dataset(&dataset, NotamFilter::new(|n| n.id == 2));
        assert_eq!(filtered.notams.len(), 1);
        assert_eq!(filtered.coordinates_lists.len(), 2);
    }
}

//! Spatial grouping of records sharing an exact coordinate.
//!
//! Records are keyed by exact `(latitude, longitude)` equality. A record
//! missing either coordinate is placed at `(0, 0)`.

use std::collections::HashMap;

use crate::models::DetailedNotam;

/// Exact coordinate key, usable in hash maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterKey {
    lat_bits: u64,
    lon_bits: u64,
}

impl ClusterKey {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_bits: normalize(latitude).to_bits(),
            lon_bits: normalize(longitude).to_bits(),
        }
    }

    pub fn latitude(&self) -> f64 {
        f64::from_bits(self.lat_bits)
    }

    pub fn longitude(&self) -> f64 {
        f64::from_bits(self.lon_bits)
    }
}

/// `-0.0 == 0.0` must produce the same key.
fn normalize(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

/// Records sharing one map position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub latitude: f64,
    pub longitude: f64,
    pub records: Vec<DetailedNotam>,
}

impl Cluster {
    pub fn key(&self) -> ClusterKey {
        ClusterKey::new(self.latitude, self.longitude)
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Sorted record ids; two clusters at one key draw alike iff these match.
    pub fn member_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.records.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Largest radius in nautical miles among the records.
    pub fn max_radius_nm(&self) -> Option<u32> {
        self.records.iter().filter_map(|r| r.notam.radius).max()
    }
}

/// Position used for grouping; absent coordinates fall back to the origin.
pub fn position(record: &DetailedNotam) -> (f64, f64) {
    (
        record.notam.latitude.unwrap_or(0.0),
        record.notam.longitude.unwrap_or(0.0),
    )
}

/// Group records by exact position.
///
/// Clusters come out by descending latitude, then descending longitude, so
/// later clusters paint over earlier ones regardless of input order. Within
/// a cluster records keep their input order.
pub fn group<'a, I>(records: I) -> Vec<Cluster>
where
    I: IntoIterator<Item = &'a DetailedNotam>,
{
    let mut groups: HashMap<ClusterKey, Vec<DetailedNotam>> = HashMap::new();

    for record in records {
        let (lat, lon) = position(record);
        groups
            .entry(ClusterKey::new(lat, lon))
            .or_default()
            .push(record.clone());
    }

    let mut clusters: Vec<Cluster> = groups
        .into_iter()
        .map(|(key, records)| Cluster {
            latitude: key.latitude(),
            longitude: key.longitude(),
            records,
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.latitude
            .total_cmp(&a.latitude)
            .then(b.longitude.total_cmp(&a.longitude))
    });

    log::debug!("Grouped records into {} clusters", clusters.len());
    clusters
}

//! Render synchronizer.
//!
//! Reconciles the entities drawn by an overlay against a new target set of
//! clusters and geometry. Entries are keyed by cluster position and geometry
//! hash: stale keys are retracted, new keys are created, and keys present on
//! both sides keep their handle untouched.
//!
//! A cluster key also carries the ids of its records. When a filter change
//! alters which records sit at a position, the old entity is retracted and a
//! new one created, so badge counts and activation payloads never go stale.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

use crate::models::CoordinatesList;
use crate::pipeline::{Cluster, ClusterKey};
use crate::render::{Activation, AsyncOverlay, Overlay};

/// Invoked when a drawn cluster is activated.
pub type ClusterHandler = Rc<dyn Fn(&Cluster)>;

/// Invoked when a drawn geometry is activated.
pub type GeometryHandler = Rc<dyn Fn(&CoordinatesList)>;

/// Operation counts of one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Creations that produced a handle
    pub created: usize,
    /// Creations the overlay declined
    pub declined: usize,
    pub retracted: usize,
    /// Keys present before and after the pass
    pub untouched: usize,
}

impl SyncReport {
    pub fn has_changes(&self) -> bool {
        self.created + self.declined + self.retracted > 0
    }

    fn record_creation(&mut self, drawn: bool) {
        if drawn {
            self.created += 1;
        } else {
            self.declined += 1;
        }
    }
}

/// Result of an asynchronous pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// A newer pass started before this one finished; its creations were discarded
    Superseded,
}

/// A tracked entity: what it was drawn from, and its handle.
/// `None` marks a declined creation.
struct Entry<F, H> {
    fingerprint: F,
    handle: Option<H>,
}

/// Handles tracked under their key.
///
/// The fingerprint describes what the entity was drawn from; a key whose
/// fingerprint changed is treated as stale.
struct Registry<K, F, H> {
    entries: HashMap<K, Entry<F, H>>,
}

impl<K: Eq + Hash + Clone, F: PartialEq, H> Registry<K, F, H> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Drop every entry whose key is not in `target` or whose fingerprint
    /// differs, returning the real handles.
    fn evict_except(&mut self, target: &HashMap<K, F>) -> Vec<H> {
        let stale: Vec<K> = self
            .entries
            .iter()
            .filter(|(key, entry)| target.get(*key) != Some(&entry.fingerprint))
            .map(|(key, _)| key.clone())
            .collect();

        stale
            .iter()
            .filter_map(|key| self.entries.remove(key).and_then(|entry| entry.handle))
            .collect()
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn insert(&mut self, key: K, fingerprint: F, handle: Option<H>) {
        self.entries.insert(key, Entry { fingerprint, handle });
    }

    fn get<Q>(&self, key: &Q) -> Option<&H>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).and_then(|entry| entry.handle.as_ref())
    }

    /// Number of real handles.
    fn tracked(&self) -> usize {
        self.entries.values().filter(|e| e.handle.is_some()).count()
    }

    fn drain(&mut self) -> Vec<H> {
        self.entries
            .drain()
            .filter_map(|(_, entry)| entry.handle)
            .collect()
    }
}

type ClusterRegistry<H> = Registry<ClusterKey, Vec<i64>, H>;
type GeometryRegistry<H> = Registry<String, (), H>;

fn cluster_activation(handler: &ClusterHandler, cluster: &Cluster) -> Activation {
    let handler = Rc::clone(handler);
    let cluster = cluster.clone();
    Rc::new(move || handler(&cluster))
}

fn geometry_activation(handler: &GeometryHandler, geometry: &CoordinatesList) -> Activation {
    let handler = Rc::clone(handler);
    let geometry = geometry.clone();
    Rc::new(move || handler(&geometry))
}

/// Target membership per key. The first cluster at a key wins.
fn cluster_targets(clusters: &[Cluster]) -> HashMap<ClusterKey, Vec<i64>> {
    let mut targets = HashMap::new();
    for cluster in clusters {
        targets
            .entry(cluster.key())
            .or_insert_with(|| cluster.member_ids());
    }
    targets
}

fn geometry_targets(geometry: &[CoordinatesList]) -> HashMap<String, ()> {
    geometry.iter().map(|cl| (cl.hash.clone(), ())).collect()
}

/// Synchronizer over a synchronous overlay, owned by one map view.
///
/// Dropping it retracts every tracked handle.
pub struct RenderSynchronizer<O: Overlay> {
    overlay: O,
    clusters: ClusterRegistry<O::Handle>,
    geometry: GeometryRegistry<O::Handle>,
    on_cluster: ClusterHandler,
    on_geometry: GeometryHandler,
}

impl<O: Overlay> RenderSynchronizer<O> {
    pub fn new(overlay: O) -> Self {
        Self {
            overlay,
            clusters: Registry::new(),
            geometry: Registry::new(),
            on_cluster: Rc::new(|_| {}),
            on_geometry: Rc::new(|_| {}),
        }
    }

    /// Handler for entities created from now on.
    pub fn on_cluster(&mut self, handler: impl Fn(&Cluster) + 'static) {
        self.on_cluster = Rc::new(handler);
    }

    pub fn on_geometry(&mut self, handler: impl Fn(&CoordinatesList) + 'static) {
        self.on_geometry = Rc::new(handler);
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    pub fn cluster_handle(&self, key: &ClusterKey) -> Option<&O::Handle> {
        self.clusters.get(key)
    }

    pub fn geometry_handle(&self, hash: &str) -> Option<&O::Handle> {
        self.geometry.get(hash)
    }

    /// Number of live handles across both registries.
    pub fn tracked(&self) -> usize {
        self.clusters.tracked() + self.geometry.tracked()
    }

    /// Reconcile the overlay with a new target set.
    pub fn sync(&mut self, clusters: &[Cluster], geometry: &[CoordinatesList]) -> SyncReport {
        let mut report = SyncReport::default();

        for handle in self.clusters.evict_except(&cluster_targets(clusters)) {
            self.overlay.retract(handle);
            report.retracted += 1;
        }
        for handle in self.geometry.evict_except(&geometry_targets(geometry)) {
            self.overlay.retract(handle);
            report.retracted += 1;
        }

        // Clusters are created in paint order; repeated keys are skipped
        let mut seen = HashSet::new();
        for cluster in clusters {
            let key = cluster.key();
            if !seen.insert(key) {
                continue;
            }
            if self.clusters.contains(&key) {
                report.untouched += 1;
                continue;
            }
            let activation = cluster_activation(&self.on_cluster, cluster);
            let handle = self.overlay.create_cluster(cluster, activation);
            report.record_creation(handle.is_some());
            self.clusters.insert(key, cluster.member_ids(), handle);
        }

        let mut seen = HashSet::new();
        for list in geometry {
            if !seen.insert(list.hash.as_str()) {
                continue;
            }
            if self.geometry.contains(&list.hash) {
                report.untouched += 1;
                continue;
            }
            let activation = geometry_activation(&self.on_geometry, list);
            let handle = self.overlay.create_geometry(list, activation);
            report.record_creation(handle.is_some());
            self.geometry.insert(list.hash.clone(), (), handle);
        }

        log::info!(
            "Synchronized overlay: {} created, {} declined, {} retracted, {} untouched",
            report.created,
            report.declined,
            report.retracted,
            report.untouched
        );
        report
    }

    /// Retract every tracked handle and forget all keys.
    pub fn teardown(&mut self) -> usize {
        let mut handles = self.clusters.drain();
        handles.extend(self.geometry.drain());

        let count = handles.len();
        for handle in handles {
            self.overlay.retract(handle);
        }
        count
    }
}

impl<O: Overlay> Drop for RenderSynchronizer<O> {
    fn drop(&mut self) {
        let count = self.teardown();
        if count > 0 {
            log::debug!("Teardown retracted {} handles", count);
        }
    }
}

/// Synchronizer over an overlay whose creations complete asynchronously.
///
/// Each pass takes a generation number. A pass whose creations complete after
/// a newer pass started retracts what it created and reports
/// [`SyncOutcome::Superseded`] instead of touching the registries.
pub struct AsyncRenderSynchronizer<O: AsyncOverlay> {
    overlay: O,
    clusters: RefCell<ClusterRegistry<O::Handle>>,
    geometry: RefCell<GeometryRegistry<O::Handle>>,
    generation: Cell<u64>,
    on_cluster: ClusterHandler,
    on_geometry: GeometryHandler,
}

impl<O: AsyncOverlay> AsyncRenderSynchronizer<O> {
    pub fn new(overlay: O) -> Self {
        Self {
            overlay,
            clusters: RefCell::new(Registry::new()),
            geometry: RefCell::new(Registry::new()),
            generation: Cell::new(0),
            on_cluster: Rc::new(|_| {}),
            on_geometry: Rc::new(|_| {}),
        }
    }

    pub fn on_cluster(&mut self, handler: impl Fn(&Cluster) + 'static) {
        self.on_cluster = Rc::new(handler);
    }

    pub fn on_geometry(&mut self, handler: impl Fn(&CoordinatesList) + 'static) {
        self.on_geometry = Rc::new(handler);
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn tracked(&self) -> usize {
        self.clusters.borrow().tracked() + self.geometry.borrow().tracked()
    }

    pub fn has_cluster(&self, key: &ClusterKey) -> bool {
        self.clusters.borrow().get(key).is_some()
    }

    pub fn has_geometry(&self, hash: &str) -> bool {
        self.geometry.borrow().get(hash).is_some()
    }

    /// Reconcile the overlay with a new target set.
    ///
    /// Stale handles are retracted before the first suspension point, so a
    /// superseded pass never leaves entities that the newer pass does not know about.
    pub async fn sync(&self, clusters: &[Cluster], geometry: &[CoordinatesList]) -> SyncOutcome {
        let pass = self.generation.get() + 1;
        self.generation.set(pass);

        let mut report = SyncReport::default();

        let wanted_clusters = cluster_targets(clusters);
        let wanted_geometry = geometry_targets(geometry);
        let stale_clusters = self.clusters.borrow_mut().evict_except(&wanted_clusters);
        let stale_geometry = self.geometry.borrow_mut().evict_except(&wanted_geometry);
        for handle in stale_clusters.into_iter().chain(stale_geometry) {
            self.overlay.retract(handle);
            report.retracted += 1;
        }

        let pending_clusters: Vec<&Cluster> = {
            let registry = self.clusters.borrow();
            let mut seen = HashSet::new();
            clusters
                .iter()
                .filter(|c| {
                    let key = c.key();
                    !registry.contains(&key) && seen.insert(key)
                })
                .collect()
        };
        let pending_geometry: Vec<&CoordinatesList> = {
            let registry = self.geometry.borrow();
            let mut seen = HashSet::new();
            geometry
                .iter()
                .filter(|cl| !registry.contains(&cl.hash) && seen.insert(cl.hash.as_str()))
                .collect()
        };
        report.untouched = (wanted_clusters.len() - pending_clusters.len())
            + (wanted_geometry.len() - pending_geometry.len());

        let cluster_jobs = pending_clusters.iter().copied().map(|cluster| {
            self.overlay
                .create_cluster(cluster, cluster_activation(&self.on_cluster, cluster))
        });
        let geometry_jobs = pending_geometry.iter().copied().map(|list| {
            self.overlay
                .create_geometry(list, geometry_activation(&self.on_geometry, list))
        });
        let (created_clusters, created_geometry) = futures::join!(
            futures::future::join_all(cluster_jobs),
            futures::future::join_all(geometry_jobs)
        );

        if self.generation.get() != pass {
            let mut discarded = 0;
            for handle in created_clusters
                .into_iter()
                .chain(created_geometry)
                .flatten()
            {
                self.overlay.retract(handle);
                discarded += 1;
            }
            log::debug!(
                "Pass {} superseded, discarded {} fresh handles",
                pass,
                discarded
            );
            return SyncOutcome::Superseded;
        }

        {
            let mut registry = self.clusters.borrow_mut();
            for (cluster, handle) in pending_clusters.into_iter().zip(created_clusters) {
                report.record_creation(handle.is_some());
                registry.insert(cluster.key(), cluster.member_ids(), handle);
            }
        }
        {
            let mut registry = self.geometry.borrow_mut();
            for (list, handle) in pending_geometry.into_iter().zip(created_geometry) {
                report.record_creation(handle.is_some());
                registry.insert(list.hash.clone(), (), handle);
            }
        }

        log::info!(
            "Synchronized overlay (pass {}): {} created, {} declined, {} retracted, {} untouched",
            pass,
            report.created,
            report.declined,
            report.retracted,
            report.untouched
        );
        SyncOutcome::Completed(report)
    }

    /// Retract every tracked handle. In-flight passes are superseded.
    pub fn teardown(&self) -> usize {
        self.generation.set(self.generation.get() + 1);

        let mut handles = self.clusters.borrow_mut().drain();
        handles.extend(self.geometry.borrow_mut().drain());

        let count = handles.len();
        for handle in handles {
            self.overlay.retract(handle);
        }
        count
    }
}

impl<O: AsyncOverlay> Drop for AsyncRenderSynchronizer<O> {
    fn drop(&mut self) {
        let count = self.teardown();
        if count > 0 {
            log::debug!("Teardown retracted {} handles", count);
        }
    }
}

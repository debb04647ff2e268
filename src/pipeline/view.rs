//! Map view: owns one synchronizer and the view's position.
//!
//! Move listeners are registered on the view itself and only hear about
//! that view's position changes.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::models::{CoordinatesList, Dataset};
use crate::pipeline::{Cluster, RenderSynchronizer, SyncReport, group};
use crate::render::Overlay;
use crate::services::{ClusterDetail, ClusterLabel, SubjectDecoder};

/// Centre and zoom of a map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

impl Default for MapPosition {
    fn default() -> Self {
        Self {
            latitude: 49.0,
            longitude: 12.0,
            zoom: 5,
        }
    }
}

/// Token returned by [`MapView::subscribe_moves`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// What the user last activated on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Cluster {
        latitude: f64,
        longitude: f64,
        label: ClusterLabel,
        detail: ClusterDetail,
    },
    Geometry(CoordinatesList),
}

impl Selection {
    fn from_cluster(cluster: &Cluster, decoder: &SubjectDecoder) -> Option<Self> {
        let detail = ClusterDetail::new(cluster.records.clone())?;
        Some(Self::Cluster {
            latitude: cluster.latitude,
            longitude: cluster.longitude,
            label: ClusterLabel::build(&cluster.records, decoder),
            detail,
        })
    }
}

type MoveListener = Box<dyn FnMut(&MapPosition)>;

/// One interactive map. Dropping the view retracts everything it drew.
pub struct MapView<O: Overlay> {
    synchronizer: RenderSynchronizer<O>,
    position: MapPosition,
    listeners: Vec<(Subscription, MoveListener)>,
    next_subscription: u64,
    selection: Rc<RefCell<Option<Selection>>>,
}

impl<O: Overlay> MapView<O> {
    pub fn new(overlay: O, decoder: SubjectDecoder) -> Self {
        let selection = Rc::new(RefCell::new(None));
        let mut synchronizer = RenderSynchronizer::new(overlay);

        let sink = Rc::clone(&selection);
        synchronizer.on_cluster(move |cluster| {
            *sink.borrow_mut() = Selection::from_cluster(cluster, &decoder);
        });
        let sink = Rc::clone(&selection);
        synchronizer.on_geometry(move |geometry| {
            *sink.borrow_mut() = Some(Selection::Geometry(geometry.clone()));
        });

        Self {
            synchronizer,
            position: MapPosition::default(),
            listeners: Vec::new(),
            next_subscription: 0,
            selection,
        }
    }

    pub fn with_position(mut self, position: MapPosition) -> Self {
        self.position = position;
        self
    }

    pub fn position(&self) -> MapPosition {
        self.position
    }

    /// Register a listener for position changes of this view.
    pub fn subscribe_moves(&mut self, listener: impl FnMut(&MapPosition) + 'static) -> Subscription {
        self.next_subscription += 1;
        let subscription = Subscription(self.next_subscription);
        self.listeners.push((subscription, Box::new(listener)));
        subscription
    }

    /// Returns false if the subscription was not registered.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != subscription);
        self.listeners.len() != before
    }

    /// Move the view and notify listeners if the position changed.
    pub fn set_position(&mut self, position: MapPosition) {
        if position == self.position {
            return;
        }
        self.position = position;
        for (_, listener) in &mut self.listeners {
            listener(&position);
        }
    }

    /// Draw an already filtered dataset: point records as clusters, geometry as is.
    pub fn show(&mut self, dataset: &Dataset) -> SyncReport {
        let clusters = group(&dataset.notams);
        self.synchronizer
            .sync(&clusters, &dataset.coordinates_lists)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.borrow().clone()
    }

    /// Step the selected cluster's detail view forward or back.
    pub fn browse(&self, forward: bool) -> Option<(usize, usize)> {
        let mut selection = self.selection.borrow_mut();
        match selection.as_mut()? {
            Selection::Cluster { detail, .. } => {
                if forward {
                    detail.next();
                } else {
                    detail.previous();
                }
                Some(detail.position())
            }
            Selection::Geometry(_) => None,
        }
    }

    pub fn clear_selection(&self) {
        self.selection.borrow_mut().take();
    }

    pub fn synchronizer(&self) -> &RenderSynchronizer<O> {
        &self.synchronizer
    }

    pub fn overlay(&self) -> &O {
        self.synchronizer.overlay()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::models::{Coordinates, DetailedNotam, NotamRecord, SUPPORTED_VERSION, TextNode};
    use crate::render::{GeoJsonOverlay, LayerId};

    fn record(id: i64, lat: f64, lon: f64, code: &str) -> DetailedNotam {
        DetailedNotam {
            notam: NotamRecord {
                notam_code: code.to_string(),
                latitude: Some(lat),
                longitude: Some(lon),
                ..Default::default()
            },
            id,
            ..Default::default()
        }
    }

    fn dataset() -> Dataset {
        let mut area = record(3, 47.0, 15.0, "QRTCA");
        area.text_nodes = vec![TextNode::coordinates("area", "h1")];
        Dataset {
            version: SUPPORTED_VERSION.to_string(),
            notams: vec![
                record(1, 48.2, 16.4, "QOBCE"),
                record(2, 48.2, 16.4, "QOBCE"),
                area,
            ],
            coordinates_lists: vec![CoordinatesList {
                hash: "h1".to_string(),
                coordinates: vec![
                    Coordinates {
                        latitude: 47.0,
                        longitude: 15.0,
                    },
                    Coordinates {
                        latitude: 47.1,
                        longitude: 15.0,
                    },
                    Coordinates {
                        latitude: 47.1,
                        longitude: 15.1,
                    },
                ],
            }],
        }
    }

    fn view() -> MapView<GeoJsonOverlay> {
        MapView::new(GeoJsonOverlay::default(), SubjectDecoder::default())
    }

    #[test]
    fn test_scoped_move_listeners() {
        let mut first = view();
        let second = view();

        let moves = Rc::new(Cell::new(0));
        let counter = Rc::clone(&moves);
        let subscription = first.subscribe_moves(move |_| counter.set(counter.get() + 1));

        let target = MapPosition {
            latitude: 48.0,
            longitude: 16.0,
            zoom: 7,
        };
        first.set_position(target);
        first.set_position(target);
        assert_eq!(moves.get(), 1);
        assert_eq!(second.position(), MapPosition::default());

        assert!(first.unsubscribe(subscription));
        assert!(!first.unsubscribe(subscription));
        first.set_position(MapPosition::default());
        assert_eq!(moves.get(), 1);
    }

    #[test]
    fn test_show_and_select_cluster() {
        let mut view = view();
        let report = view.show(&dataset());
        // two clusters and one area
        assert_eq!(report.created, 3);

        let key = crate::pipeline::ClusterKey::new(48.2, 16.4);
        let layer: LayerId = *view.synchronizer().cluster_handle(&key).unwrap();
        assert!(view.overlay().activate(layer));

        match view.selection() {
            Some(Selection::Cluster { label, detail, .. }) => {
                assert_eq!(label.to_string(), "Obstacle erected (\u{00D7}2)");
                assert_eq!(detail.position(), (1, 2));
            }
            other => panic!("unexpected selection {other:?}"),
        }
        assert_eq!(view.browse(true), Some((2, 2)));
        assert_eq!(view.browse(true), Some((1, 2)));

        view.clear_selection();
        assert!(view.selection().is_none());
    }

    #[test]
    fn test_select_geometry() {
        let mut view = view();
        view.show(&dataset());
        let layer = *view.synchronizer().geometry_handle("h1").unwrap();
        view.overlay().activate(layer);
        assert!(matches!(view.selection(), Some(Selection::Geometry(g)) if g.hash == "h1"));
        assert_eq!(view.browse(true), None);
    }

    #[test]
    fn test_show_again_is_a_no_op() {
        let mut view = view();
        view.show(&dataset());
        let report = view.show(&dataset());
        assert!(!report.has_changes());
        assert_eq!(report.untouched, 3);
        assert_eq!(view.overlay().len(), 3);
    }

    #[test]
    fn test_narrowed_cluster_is_redrawn() {
        let mut view = view();
        view.show(&dataset());
        let key = crate::pipeline::ClusterKey::new(48.2, 16.4);
        let before: LayerId = *view.synchronizer().cluster_handle(&key).unwrap();

        let narrowed = crate::pipeline::filter_dataset(
            &dataset(),
            crate::pipeline::NotamFilter::new(|n| n.id != 2),
        );
        let report = view.show(&narrowed);
        assert_eq!(report.retracted, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.untouched, 1);

        let after: LayerId = *view.synchronizer().cluster_handle(&key).unwrap();
        assert_ne!(before, after);
        assert!(!view.overlay().contains(before));

        let features = view.overlay().to_feature_collection();
        let marker = features["features"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| {
                f["properties"]["layer"] == after.to_string() && f["properties"]["kind"] == "marker"
            })
            .unwrap();
        assert_eq!(marker["properties"]["count"], 1);
        assert_eq!(marker["properties"]["ids"], serde_json::json!([1]));

        view.overlay().activate(after);
        match view.selection() {
            Some(Selection::Cluster { detail, .. }) => {
                let ids: Vec<i64> = detail.records().iter().map(|r| r.id).collect();
                assert_eq!(ids, vec![1]);
            }
            other => panic!("unexpected selection {other:?}"),
        }
    }
}

//! In-memory overlay that renders to a GeoJSON feature collection.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Value, json};

use crate::models::{Coordinates, CoordinatesList};
use crate::pipeline::Cluster;
use crate::render::{Activation, MarkerRenderer, Overlay};

/// Plain GeoJSON point feature without properties.
pub fn point(latitude: f64, longitude: f64) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [longitude, latitude] },
        "properties": {},
    })
}

/// Feature for an ordered coordinate sequence: point, line or closed polygon.
///
/// Returns `None` for an empty sequence.
pub fn polygon(coordinates: &[Coordinates]) -> Option<Value> {
    let positions: Vec<[f64; 2]> = coordinates
        .iter()
        .map(|c| [c.longitude, c.latitude])
        .collect();

    let geometry = match positions.as_slice() {
        [] => return None,
        [single] => json!({ "type": "Point", "coordinates": single }),
        [_, _] => json!({ "type": "LineString", "coordinates": positions }),
        [first, ..] => {
            let mut ring = positions.clone();
            if ring.last() != Some(first) {
                ring.push(*first);
            }
            json!({ "type": "Polygon", "coordinates": [ring] })
        }
    };

    Some(json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {},
    }))
}

/// Strategy turning clusters and geometry into features.
pub trait FeatureRenderer {
    fn render_cluster(&mut self, cluster: &Cluster) -> Vec<Value>;

    /// `None` declines drawing the geometry.
    fn render_geometry(&mut self, geometry: &CoordinatesList) -> Option<Vec<Value>>;
}

/// Handle of one drawn layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

struct Layer {
    features: Vec<Value>,
    on_activate: Activation,
}

/// Overlay keeping drawn layers in creation order.
pub struct GeoJsonOverlay<R: FeatureRenderer = MarkerRenderer> {
    renderer: R,
    layers: BTreeMap<LayerId, Layer>,
    next_id: u64,
}

impl Default for GeoJsonOverlay<MarkerRenderer> {
    fn default() -> Self {
        Self::new(MarkerRenderer::default())
    }
}

impl<R: FeatureRenderer> GeoJsonOverlay<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            layers: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    /// Fire the activation callback of a layer, as a click would.
    pub fn activate(&self, id: LayerId) -> bool {
        match self.layers.get(&id) {
            Some(layer) => {
                (layer.on_activate)();
                true
            }
            None => false,
        }
    }

    /// All features; later layers paint on top.
    pub fn to_feature_collection(&self) -> Value {
        let features: Vec<Value> = self
            .layers
            .iter()
            .flat_map(|(id, layer)| {
                layer.features.iter().cloned().map(move |mut feature| {
                    feature["properties"]["layer"] = json!(id.to_string());
                    feature
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }

    fn add(&mut self, features: Vec<Value>, on_activate: Activation) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(
            id,
            Layer {
                features,
                on_activate,
            },
        );
        id
    }
}

impl<R: FeatureRenderer> Overlay for GeoJsonOverlay<R> {
    type Handle = LayerId;

    fn create_cluster(&mut self, cluster: &Cluster, on_activate: Activation) -> Option<LayerId> {
        let features = self.renderer.render_cluster(cluster);
        if features.is_empty() {
            return None;
        }
        Some(self.add(features, on_activate))
    }

    fn create_geometry(
        &mut self,
        geometry: &CoordinatesList,
        on_activate: Activation,
    ) -> Option<LayerId> {
        let features = self.renderer.render_geometry(geometry)?;
        Some(self.add(features, on_activate))
    }

    fn retract(&mut self, handle: LayerId) {
        if self.layers.remove(&handle).is_none() {
            log::warn!("Retracting unknown {}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::models::{DetailedNotam, NotamRecord};

    fn at(lat: f64, lon: f64) -> Coordinates {
        Coordinates {
            latitude: lat,
            longitude: lon,
        }
    }

    fn noop() -> Activation {
        Rc::new(|| {})
    }

    fn overlay() -> GeoJsonOverlay {
        GeoJsonOverlay::default()
    }

    #[test]
    fn test_polygon_shapes() {
        assert!(polygon(&[]).is_none());

        let single = polygon(&[at(48.0, 16.0)]).unwrap();
        assert_eq!(single["geometry"]["type"], "Point");
        assert_eq!(single["geometry"]["coordinates"], json!([16.0, 48.0]));

        let line = polygon(&[at(1.0, 2.0), at(3.0, 4.0)]).unwrap();
        assert_eq!(line["geometry"]["type"], "LineString");

        let area = polygon(&[at(0.0, 0.0), at(0.0, 1.0), at(1.0, 1.0)]).unwrap();
        assert_eq!(area["geometry"]["type"], "Polygon");
        // ring is closed
        assert_eq!(
            area["geometry"]["coordinates"][0].as_array().unwrap().len(),
            4
        );
    }

    #[test]
    fn test_create_retract_and_collect() {
        let mut overlay = overlay();
        let cluster = Cluster {
            latitude: 48.2,
            longitude: 16.4,
            records: vec![DetailedNotam {
                notam: NotamRecord::default(),
                id: 4,
                ..Default::default()
            }],
        };

        let marker = overlay.create_cluster(&cluster, noop()).unwrap();
        let area = overlay
            .create_geometry(
                &CoordinatesList {
                    hash: "h".to_string(),
                    coordinates: vec![at(0.0, 0.0), at(0.0, 1.0), at(1.0, 1.0)],
                },
                noop(),
            )
            .unwrap();
        assert_ne!(marker, area);

        let collection = overlay.to_feature_collection();
        assert_eq!(collection["features"].as_array().unwrap().len(), 2);
        assert_eq!(collection["features"][0]["properties"]["kind"], "marker");
        assert_eq!(collection["features"][1]["properties"]["kind"], "geometry");

        overlay.retract(marker);
        assert!(!overlay.contains(marker));
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn test_empty_geometry_declined() {
        let mut overlay = overlay();
        let empty = CoordinatesList {
            hash: "e".to_string(),
            coordinates: Vec::new(),
        };
        assert!(overlay.create_geometry(&empty, noop()).is_none());
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_activate_runs_callback() {
        let mut overlay = overlay();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let id = overlay
            .create_geometry(
                &CoordinatesList {
                    hash: "p".to_string(),
                    coordinates: vec![at(1.0, 1.0)],
                },
                Rc::new(move || counter.set(counter.get() + 1)),
            )
            .unwrap();

        assert!(overlay.activate(id));
        assert_eq!(clicks.get(), 1);

        overlay.retract(id);
        assert!(!overlay.activate(id));
    }
}

//! Marker rendering strategy and badge icon cache.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde_json::{Value, json};

use crate::models::{CoordinatesList, RenderConfig};
use crate::pipeline::Cluster;
use crate::render::geojson::{self, FeatureRenderer};

/// One nautical mile in metres.
pub const NM_TO_M: f64 = 1852.0;

/// Badge text is cut to this many characters.
const MAX_BADGE_CHARS: usize = 3;

/// Line weight of a single-point geometry.
const POINT_WEIGHT: u32 = 6;
const AREA_WEIGHT: u32 = 3;

/// HTML of a pin shaped badge with up to three characters of text.
pub fn icon_markup(color: &str, text: &str) -> String {
    let text: String = text.chars().take(MAX_BADGE_CHARS).collect();
    let style = format!(
        "background-color: {}; width: 1.5rem; height: 1.5rem; display: block; \
         left: -0.75rem; top: -0.75rem; position: relative; \
         border-radius: 1.5rem 1.5rem 0; transform: rotate(45deg); border: 1px solid #FFFFFF",
        escape(color)
    );
    format!(
        "<span style=\"{style}\"><span style=\"display: block; transform: rotate(-45deg); \
         text-align: center; font-size: 1rem; font-family: monospace;\">{}</span></span>",
        escape(&text)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Bounded LRU of rendered badge icons keyed by colour and text.
#[derive(Debug)]
pub struct IconCache {
    capacity: usize,
    entries: HashMap<(String, String), Rc<str>>,
    /// Least recently used at the front
    order: VecDeque<(String, String)>,
    hits: u64,
    misses: u64,
}

impl IconCache {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached icon or render and insert it, evicting the oldest entry.
    pub fn get_or_render(&mut self, color: &str, text: &str) -> Rc<str> {
        let key = (color.to_string(), text.to_string());

        if let Some(icon) = self.entries.get(&key).cloned() {
            self.hits += 1;
            self.touch(&key);
            return icon;
        }

        self.misses += 1;
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                log::trace!("Evicted icon {:?}", oldest);
            }
        }

        let icon: Rc<str> = icon_markup(color, text).into();
        self.entries.insert(key.clone(), Rc::clone(&icon));
        self.order.push_back(key);
        icon
    }

    fn touch(&mut self, key: &(String, String)) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Default strategy: badge marker plus radius circle for clusters, and a
/// polygon outline for geometry.
///
/// Wraps the plain GeoJSON primitives and adds icon, hover and click styling.
#[derive(Debug)]
pub struct MarkerRenderer {
    style: RenderConfig,
    icons: IconCache,
}

impl Default for MarkerRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl MarkerRenderer {
    pub fn new(style: RenderConfig) -> Self {
        let icons = IconCache::new(style.icon_cache_capacity);
        Self { style, icons }
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    /// Circle radius in metres, if one should be drawn.
    fn circle_radius(&self, cluster: &Cluster) -> Option<f64> {
        let radius = f64::from(cluster.max_radius_nm()?) * NM_TO_M;
        (radius < self.style.max_circle_radius_m).then_some(radius)
    }
}

impl FeatureRenderer for MarkerRenderer {
    fn render_cluster(&mut self, cluster: &Cluster) -> Vec<Value> {
        let badge = cluster.size().to_string();
        let icon = self.icons.get_or_render(&self.style.cluster_color, &badge);

        let mut marker = geojson::point(cluster.latitude, cluster.longitude);
        marker["properties"] = json!({
            "kind": "marker",
            "count": cluster.size(),
            "icon": &*icon,
            "ids": cluster.records.iter().map(|r| r.id).collect::<Vec<_>>(),
        });

        let mut features = vec![marker];
        if let Some(radius) = self.circle_radius(cluster) {
            let mut circle = geojson::point(cluster.latitude, cluster.longitude);
            circle["properties"] = json!({
                "kind": "circle",
                "radius": radius,
                "color": self.style.circle_color,
                "hoverColor": self.style.circle_hover_color,
            });
            features.push(circle);
        }
        features
    }

    fn render_geometry(&mut self, geometry: &CoordinatesList) -> Option<Vec<Value>> {
        let mut shape = geojson::polygon(&geometry.coordinates)?;
        let weight = if geometry.is_point() {
            POINT_WEIGHT
        } else {
            AREA_WEIGHT
        };
        shape["properties"] = json!({
            "kind": "geometry",
            "hash": geometry.hash,
            "color": self.style.geometry_color,
            "weight": weight,
        });
        Some(vec![shape])
    }
}

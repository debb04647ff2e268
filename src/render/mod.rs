//! Drawing collaborators.
//!
//! The synchronizer only sees the traits below; a handle returned by a
//! collaborator is never inspected, only stored and handed back for
//! retraction.
//!
//! - `GeoJsonOverlay`: in-memory overlay producing a GeoJSON feature collection
//! - `MarkerRenderer`: composed strategy turning clusters and geometry into features
//! - `IconCache`: bounded LRU of rendered badge icons

pub mod geojson;
pub mod marker;

use std::rc::Rc;

use async_trait::async_trait;

use crate::models::CoordinatesList;
use crate::pipeline::Cluster;

pub use geojson::{FeatureRenderer, GeoJsonOverlay, LayerId};
pub use marker::{IconCache, MarkerRenderer, NM_TO_M, icon_markup};

/// Callback wired to a drawn entity's click/activation event.
pub type Activation = Rc<dyn Fn()>;

/// Synchronous drawing collaborator.
pub trait Overlay {
    type Handle;

    /// Draw a cluster. `None` means nothing was drawn.
    fn create_cluster(&mut self, cluster: &Cluster, on_activate: Activation)
    -> Option<Self::Handle>;

    /// Draw a geometry. `None` means the collaborator declined.
    fn create_geometry(
        &mut self,
        geometry: &CoordinatesList,
        on_activate: Activation,
    ) -> Option<Self::Handle>;

    /// Remove a previously drawn entity.
    fn retract(&mut self, handle: Self::Handle);
}

/// Drawing collaborator whose creations complete asynchronously.
///
/// Retraction stays synchronous so that handles can be released from `Drop`.
#[async_trait(?Send)]
pub trait AsyncOverlay {
    type Handle;

    async fn create_cluster(&self, cluster: &Cluster, on_activate: Activation)
    -> Option<Self::Handle>;

    async fn create_geometry(
        &self,
        geometry: &CoordinatesList,
        on_activate: Activation,
    ) -> Option<Self::Handle>;

    fn retract(&self, handle: Self::Handle);
}

//! Pipeline from a loaded dataset to drawn map entities.
//!
//! - `filter`: compile filter options and drop orphaned geometry
//! - `grouping`: cluster records sharing a position
//! - `sync`: reconcile an overlay against clusters and geometry
//! - `view`: a map view owning one synchronizer
//! - `data_layer`: selected country, filter options and displayed data

pub mod data_layer;
pub mod filter;
pub mod grouping;
pub mod sync;
pub mod view;

pub use data_layer::{LoadOutcome, NotamDataLayer};
pub use filter::{NotamFilter, filter_dataset};
pub use grouping::{Cluster, ClusterKey, group, position};
pub use sync::{
    AsyncRenderSynchronizer, ClusterHandler, GeometryHandler, RenderSynchronizer, SyncOutcome,
    SyncReport,
};
pub use view::{MapPosition, MapView, Selection, Subscription};

//! Look Around panorama adapter.
//!
//! Loads the six faces of a panorama at a coarse tier, builds the mesh they
//! are drawn on, and then keeps upgrading whichever faces the camera looks at
//! as it moves and zooms. Results that arrive after the viewer switched to
//! another panorama are dropped.

mod adapter;
mod error;
mod host;
mod mesh;
mod refresh;

pub use adapter::{ADAPTER_ID, LookaroundAdapter, PanoramaAdapter, PanoramaTextures};
pub use error::AdapterError;
pub use host::{ViewerEvent, ViewerHost};
pub use mesh::{FaceMaterial, PanoMesh};
pub use refresh::{
    FaceRecord, FaceTable, LoadState, RefreshCompletion, RefreshController, RefreshOutcome,
    RefreshTicket, RequestId,
};

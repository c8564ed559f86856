//! Face tile fetching for Look Around panoramas.
//!
//! Every face of a panorama is served as one image per resolution tier at a
//! deterministic URL. [`TileFetcher`] downloads through a [`TileSource`],
//! decodes to RGBA and tags the result with the panorama and tier it was
//! fetched for.

mod error;
mod fetcher;
mod panorama;
mod source;

pub use error::{FetchError, ParsePanoramaError, TileError};
pub use fetcher::{FaceTexture, TileFetcher};
pub use panorama::{PanoramaRef, ResolutionTier, face_url};
pub use source::{HttpTileSource, MemoryTileSource, TileSource, encode_png};

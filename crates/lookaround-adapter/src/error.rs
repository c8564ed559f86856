use lookaround_tiles::{FetchError, PanoramaRef};
use thiserror::Error;

/// Errors surfaced by [`crate::LookaroundAdapter`].
#[derive(Debug, Error)]
pub enum AdapterError {
    /// One of the six initial face fetches failed; nothing was loaded.
    #[error("initial load of panorama {panorama} failed")]
    InitialLoadFailed {
        panorama: PanoramaRef,
        #[source]
        source: FetchError,
    },
}

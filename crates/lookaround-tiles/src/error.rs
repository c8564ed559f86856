use lookaround_mesh::FaceIndex;
use thiserror::Error;

/// Why a single tile request failed.
#[derive(Debug, Error)]
pub enum TileError {
    /// Transport failure, including timeouts.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The source has no tile at this URL.
    #[error("no tile at {url}")]
    Missing {
        /// Requested URL.
        url: String,
    },

    /// The body is not a decodable image.
    #[error("tile decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// The blocking decode task panicked or was cancelled.
    #[error("tile decode task failed: {0}")]
    DecodeTask(#[from] tokio::task::JoinError),
}

/// A face could not be fetched. Not retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch face {face}")]
    FetchFailed {
        face: FaceIndex,
        #[source]
        cause: TileError,
    },
}

impl FetchError {
    /// Face the failed request was for.
    pub fn face(&self) -> FaceIndex {
        match self {
            FetchError::FetchFailed { face, .. } => *face,
        }
    }
}

/// A string is not of the form `/pano/{id}/{heading}/`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("not a panorama path: {0:?}")]
pub struct ParsePanoramaError(pub String);

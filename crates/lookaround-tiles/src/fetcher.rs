//! Face downloads, decoding and the six-face initial load.

use std::cell::RefCell;
use std::sync::Arc;

use image::RgbaImage;
use lookaround_config::Config;
use lookaround_mesh::{FACE_COUNT, FaceIndex};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::{FetchError, TileError};
use crate::panorama::{PanoramaRef, ResolutionTier, face_url};
use crate::source::TileSource;

/// Share of a face's progress attributed to the download; decoding finishes it.
const DOWNLOAD_SHARE: f32 = 0.9;

/// Decoded image of one face at one tier.
#[derive(Clone, Debug)]
pub struct FaceTexture {
    /// Face the image belongs to.
    pub face: FaceIndex,
    /// Tier it was fetched at.
    pub tier: ResolutionTier,
    /// Panorama it was fetched for.
    pub panorama: PanoramaRef,
    /// Decoded pixels, shared between the load result and the mesh.
    pub image: Arc<RgbaImage>,
}

impl FaceTexture {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Fetches face tiles from a [`TileSource`].
///
/// Requests may optionally be capped by a semaphore; with no cap every
/// request starts immediately.
pub struct TileFetcher<S> {
    source: S,
    endpoint: String,
    limit: Option<Semaphore>,
}

impl<S: TileSource> TileFetcher<S> {
    /// Fetcher using the configured endpoint and concurrency cap.
    pub fn new(source: S, config: &Config) -> Self {
        let max = config.tiles.max_concurrent_fetches;
        Self {
            source,
            endpoint: config.viewer.endpoint.clone(),
            limit: (max > 0).then(|| Semaphore::new(max)),
        }
    }

    /// Uncapped fetcher for `endpoint`.
    pub fn with_endpoint(source: S, endpoint: impl Into<String>) -> Self {
        Self {
            source,
            endpoint: endpoint.into(),
            limit: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL of `face` of `panorama` at `tier`.
    pub fn url(&self, panorama: PanoramaRef, tier: ResolutionTier, face: FaceIndex) -> String {
        face_url(&self.endpoint, panorama, tier, face)
    }

    /// Download and decode one face.
    ///
    /// Progress runs to 0.9 while bytes arrive and reaches 1.0 once the image
    /// is decoded. Decoding runs on the blocking pool.
    pub async fn fetch_face(
        &self,
        panorama: PanoramaRef,
        tier: ResolutionTier,
        face: FaceIndex,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<FaceTexture, FetchError> {
        let url = self.url(panorama, tier, face);
        let failed = |cause: TileError| FetchError::FetchFailed { face, cause };

        let _permit = match &self.limit {
            Some(limit) => limit.acquire().await.ok(),
            None => None,
        };

        debug!(%url, "fetching face");
        let bytes = self
            .source
            .fetch(&url, &mut |p: f32| {
                on_progress(p.clamp(0.0, 1.0) * DOWNLOAD_SHARE)
            })
            .await
            .map_err(failed)?;

        // Large tiles take long to decode; keep it off the event loop.
        let image = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|decoded| decoded.into_rgba8())
        })
        .await
        .map_err(|e| failed(TileError::DecodeTask(e)))?
        .map_err(|e| failed(TileError::Decode(e)))?;
        on_progress(1.0);

        debug!(
            face = face.index(),
            tier = tier.value(),
            width = image.width(),
            height = image.height(),
            "face decoded"
        );

        Ok(FaceTexture {
            face,
            tier,
            panorama,
            image: Arc::new(image),
        })
    }

    /// Fetch all six faces concurrently.
    ///
    /// Progress is the mean of the six per-face progresses. The first failing
    /// face fails the whole load; the other requests are dropped.
    pub async fn fetch_all_faces(
        &self,
        panorama: PanoramaRef,
        tier: ResolutionTier,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<[FaceTexture; FACE_COUNT], FetchError> {
        let progress = RefCell::new([0.0_f32; FACE_COUNT]);
        let sink = RefCell::new(on_progress);
        let report = |face: FaceIndex, p: f32| {
            let mean = {
                let mut all = progress.borrow_mut();
                all[face.index()] = p;
                all.iter().sum::<f32>() / FACE_COUNT as f32
            };
            let mut out = sink.borrow_mut();
            (*out)(mean);
        };

        let [f0, f1, f2, f3, f4, f5] = FaceIndex::ALL;
        let mut p0 = |p| report(f0, p);
        let mut p1 = |p| report(f1, p);
        let mut p2 = |p| report(f2, p);
        let mut p3 = |p| report(f3, p);
        let mut p4 = |p| report(f4, p);
        let mut p5 = |p| report(f5, p);

        let (t0, t1, t2, t3, t4, t5) = tokio::try_join!(
            self.fetch_face(panorama, tier, f0, &mut p0),
            self.fetch_face(panorama, tier, f1, &mut p1),
            self.fetch_face(panorama, tier, f2, &mut p2),
            self.fetch_face(panorama, tier, f3, &mut p3),
            self.fetch_face(panorama, tier, f4, &mut p4),
            self.fetch_face(panorama, tier, f5, &mut p5),
        )?;

        Ok([t0, t1, t2, t3, t4, t5])
    }
}

//! Where tile bytes come from.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use futures_util::StreamExt;
use image::{ImageFormat, RgbaImage};
use lookaround_config::TileConfig;
use tokio::sync::Notify;
use tracing::trace;

use crate::error::TileError;

/// Byte source for tile URLs.
///
/// `on_progress` receives the downloaded fraction in `0..=1` whenever it is
/// known.
#[allow(async_fn_in_trait)]
pub trait TileSource {
    async fn fetch(
        &self,
        url: &str,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>, TileError>;
}

// ---------------------------------------------------------------------------
// HttpTileSource
// ---------------------------------------------------------------------------

/// Tiles served over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpTileSource {
    client: reqwest::Client,
}

impl HttpTileSource {
    /// Client with the configured per-request timeout.
    pub fn new(config: &TileConfig) -> Result<Self, TileError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl TileSource for HttpTileSource {
    async fn fetch(
        &self,
        url: &str,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>, TileError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TileError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length().filter(|len| *len > 0);
        let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            body.extend_from_slice(&chunk);
            if let Some(total) = total {
                on_progress((body.len() as f32 / total as f32).min(1.0));
            }
        }
        trace!(url, bytes = body.len(), "tile downloaded");
        on_progress(1.0);
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// MemoryTileSource
// ---------------------------------------------------------------------------

/// Tiles held in memory, keyed by full URL.
///
/// A URL can be made to fail, or gated so its response is held back until
/// the returned [`Notify`] is signalled. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryTileSource {
    tiles: RefCell<HashMap<String, Vec<u8>>>,
    failing: RefCell<HashSet<String>>,
    gates: RefCell<HashMap<String, Rc<Notify>>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` at `url`.
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.tiles.borrow_mut().insert(url.into(), bytes);
    }

    /// Serve `image` PNG-encoded at `url`.
    pub fn insert_image(&self, url: impl Into<String>, image: &RgbaImage) -> Result<(), TileError> {
        self.insert(url, encode_png(image)?);
        Ok(())
    }

    /// Make requests for `url` fail with [`TileError::Missing`].
    pub fn fail(&self, url: impl Into<String>) {
        self.failing.borrow_mut().insert(url.into());
    }

    /// Hold responses for `url` until the returned handle is notified.
    pub fn gate(&self, url: impl Into<String>) -> Rc<Notify> {
        let notify = Rc::new(Notify::new());
        self.gates.borrow_mut().insert(url.into(), Rc::clone(&notify));
        notify
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl TileSource for MemoryTileSource {
    async fn fetch(
        &self,
        url: &str,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>, TileError> {
        self.requests.borrow_mut().push(url.to_string());

        let gate = self.gates.borrow().get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let missing = || TileError::Missing {
            url: url.to_string(),
        };
        if self.failing.borrow().contains(url) {
            return Err(missing());
        }
        let bytes = self.tiles.borrow().get(url).cloned().ok_or_else(missing)?;
        on_progress(1.0);
        Ok(bytes)
    }
}

/// Encode `image` as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, TileError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

//! Look Around adapter: initial loads, mesh creation and dynamic refresh.

use std::collections::HashMap;
use std::rc::Rc;

use lookaround_config::Config;
use lookaround_frustum::{CameraState, visible_faces};
use lookaround_mesh::{FACE_COUNT, PanoGeometry};
use lookaround_tiles::{FaceTexture, PanoramaRef, ResolutionTier, TileFetcher, TileSource};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::error::AdapterError;
use crate::host::{ViewerEvent, ViewerHost};
use crate::mesh::PanoMesh;
use crate::refresh::{
    FaceTable, RefreshCompletion, RefreshController, RefreshOutcome, RefreshTicket, RequestId,
};

/// Identifier the viewer registers the adapter under.
pub const ADAPTER_ID: &str = "lookaround";

/// Operations a viewer drives a panorama adapter through.
#[allow(async_fn_in_trait)]
pub trait PanoramaAdapter {
    /// Renderable object created for every panorama.
    type Mesh;
    /// Result of a texture load.
    type TextureData;

    fn supports_transition(&self) -> bool;
    fn supports_preload(&self) -> bool;
    fn supports_download(&self) -> bool;

    async fn load_texture(
        &mut self,
        panorama: PanoramaRef,
    ) -> Result<Self::TextureData, AdapterError>;

    fn create_mesh(&self, scale: f32) -> Self::Mesh;

    fn set_texture(&mut self, mesh: &mut Self::Mesh, textures: &Self::TextureData);

    fn set_texture_opacity(&self, mesh: &mut Self::Mesh, opacity: f32);

    fn dispose_texture(&mut self, textures: Self::TextureData);
}

/// The six faces of one panorama at the initial tier.
#[derive(Clone, Debug)]
pub struct PanoramaTextures {
    /// Panorama the faces were fetched for.
    pub panorama: PanoramaRef,
    /// One texture per face, in [`FaceIndex::ALL`](lookaround_mesh::FaceIndex::ALL) order.
    pub faces: [FaceTexture; FACE_COUNT],
}

/// Adapter for Look Around panoramas.
///
/// Refreshes run as local tasks and must be driven from inside a
/// [`tokio::task::LocalSet`]. Their results are queued until the owner
/// applies them with [`LookaroundAdapter::apply_completion`] or
/// [`LookaroundAdapter::drain_completions`].
pub struct LookaroundAdapter<S> {
    config: Config,
    fetcher: Rc<TileFetcher<S>>,
    host: Rc<dyn ViewerHost>,
    controller: RefreshController,
    /// Panorama most recently requested by the viewer.
    live: Option<PanoramaRef>,
    /// Panorama whose textures are on the mesh.
    installed: Option<PanoramaRef>,
    in_flight: HashMap<RequestId, AbortHandle>,
    completions_tx: mpsc::UnboundedSender<RefreshCompletion>,
    completions_rx: mpsc::UnboundedReceiver<RefreshCompletion>,
}

impl<S: TileSource + 'static> LookaroundAdapter<S> {
    pub fn new(source: S, config: Config, host: Rc<dyn ViewerHost>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            fetcher: Rc::new(TileFetcher::new(source, &config)),
            controller: RefreshController::new(config.refresh.clone()),
            config,
            host,
            live: None,
            installed: None,
            in_flight: HashMap::new(),
            completions_tx,
            completions_rx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &TileFetcher<S> {
        &self.fetcher
    }

    pub fn controller(&self) -> &RefreshController {
        &self.controller
    }

    pub fn live_panorama(&self) -> Option<PanoramaRef> {
        self.live
    }

    pub fn installed_panorama(&self) -> Option<PanoramaRef> {
        self.installed
    }

    /// Refreshes issued and not yet applied.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Look for sharper textures for the visible faces.
    ///
    /// `pending_yaw` replaces the camera yaw while a rotation is under way.
    /// Returns the number of requests issued.
    pub fn refresh(
        &mut self,
        mesh: &PanoMesh,
        camera: &CameraState,
        pending_yaw: Option<f32>,
    ) -> usize {
        if !self.config.refresh.dynamic_loading {
            return 0;
        }
        let Some(installed) = self.controller.panorama() else {
            return 0;
        };
        if self.live != Some(installed) {
            return 0;
        }

        let target = self.controller.target_tier(camera.vertical_fov_deg);
        let visible = visible_faces(
            mesh.geometry(),
            camera,
            pending_yaw,
            self.config.refresh.frustum_sample_stride,
        );
        let tickets = self.controller.plan(visible, target);
        for ticket in &tickets {
            self.spawn_refresh(*ticket);
        }
        tickets.len()
    }

    /// React to a viewer event.
    pub fn handle_event(&mut self, mesh: &PanoMesh, event: ViewerEvent) -> usize {
        let camera = self.host.camera();
        match event {
            ViewerEvent::PositionUpdated | ViewerEvent::ZoomUpdated => {
                self.refresh(mesh, &camera, None)
            }
            ViewerEvent::RotationStarted { yaw } => self.refresh(mesh, &camera, Some(yaw)),
        }
    }

    fn spawn_refresh(&mut self, ticket: RefreshTicket) {
        debug!(
            face = ticket.face.index(),
            tier = ticket.tier.value(),
            request = %ticket.request,
            "requesting sharper face"
        );
        let fetcher = Rc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        let handle = tokio::task::spawn_local(async move {
            let result = fetcher
                .fetch_face(ticket.panorama, ticket.tier, ticket.face, &mut |_| {})
                .await;
            let _ = tx.send(RefreshCompletion { ticket, result });
        });
        self.in_flight.insert(ticket.request, handle.abort_handle());
    }

    /// Wait for the next refresh result. `None` once nothing is in flight.
    ///
    /// The request stops counting as in flight once received. Pass the
    /// result to [`apply_completion`](Self::apply_completion); a dropped
    /// result leaves its face marked as refreshing until the next panorama.
    pub async fn next_completion(&mut self) -> Option<RefreshCompletion> {
        let completion = match self.completions_rx.try_recv() {
            Ok(completion) => completion,
            Err(_) if self.in_flight.is_empty() => return None,
            Err(_) => self.completions_rx.recv().await?,
        };
        self.in_flight.remove(&completion.ticket.request);
        Some(completion)
    }

    /// Apply one refresh result to `mesh`, asking for a redraw if it changed.
    pub fn apply_completion(
        &mut self,
        mesh: &mut PanoMesh,
        completion: RefreshCompletion,
    ) -> RefreshOutcome {
        let outcome = self.controller.complete(self.live, mesh, completion);
        if let RefreshOutcome::Installed { .. } = outcome {
            self.host.request_render();
        }
        outcome
    }

    /// Apply every result that is already queued.
    pub fn drain_completions(&mut self, mesh: &mut PanoMesh) -> Vec<RefreshOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.in_flight.remove(&completion.ticket.request);
            outcomes.push(self.apply_completion(mesh, completion));
        }
        outcomes
    }

    fn abort_refreshes(&mut self) {
        let cancelled = self.controller.cancel_in_flight();
        for request in &cancelled {
            if let Some(handle) = self.in_flight.remove(request) {
                handle.abort();
            }
        }
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
        if !cancelled.is_empty() {
            debug!(count = cancelled.len(), "aborted outstanding refreshes");
        }
    }
}

impl<S: TileSource + 'static> PanoramaAdapter for LookaroundAdapter<S> {
    type Mesh = PanoMesh;
    type TextureData = PanoramaTextures;

    fn supports_transition(&self) -> bool {
        false
    }

    fn supports_preload(&self) -> bool {
        false
    }

    fn supports_download(&self) -> bool {
        false
    }

    /// Fetch all six faces at the initial tier.
    ///
    /// Outstanding refreshes of the previous panorama are aborted first. If
    /// any face fails the load fails and the previous panorama stays live.
    async fn load_texture(&mut self, panorama: PanoramaRef) -> Result<PanoramaTextures, AdapterError> {
        self.live = Some(panorama);
        self.abort_refreshes();

        let tier = ResolutionTier(self.config.tiles.initial_tier);
        info!("Loading panorama {panorama} at tier {tier}");

        let fetcher = Rc::clone(&self.fetcher);
        let host = Rc::clone(&self.host);
        match fetcher
            .fetch_all_faces(panorama, tier, &mut |p| host.set_progress(p))
            .await
        {
            Ok(faces) => {
                info!("Panorama {panorama} loaded");
                Ok(PanoramaTextures { panorama, faces })
            }
            Err(source) => {
                warn!("Panorama {panorama} failed to load: {source}");
                self.live = self.installed;
                Err(AdapterError::InitialLoadFailed { panorama, source })
            }
        }
    }

    fn create_mesh(&self, scale: f32) -> PanoMesh {
        PanoMesh::new(PanoGeometry::build(
            self.config.viewer.sphere_radius,
            scale,
            &self.config.mesh,
        ))
    }

    /// Display the initial textures, then upgrade whatever is in view.
    fn set_texture(&mut self, mesh: &mut PanoMesh, textures: &PanoramaTextures) {
        for texture in &textures.faces {
            mesh.install(texture.clone());
        }
        self.controller
            .install_table(FaceTable::from_textures(textures.panorama, &textures.faces));
        self.installed = Some(textures.panorama);
        debug!(panorama = %textures.panorama, "initial textures installed");

        let camera = self.host.camera();
        self.refresh(mesh, &camera, None);
    }

    fn set_texture_opacity(&self, mesh: &mut PanoMesh, opacity: f32) {
        mesh.set_opacity(opacity);
    }

    fn dispose_texture(&mut self, textures: PanoramaTextures) {
        debug!(panorama = %textures.panorama, "textures disposed");
        drop(textures);
    }
}

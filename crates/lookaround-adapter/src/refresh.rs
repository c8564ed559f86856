//! Per-face refresh state and the decisions of the refresh controller.
//!
//! The controller is synchronous: it decides which faces to request and
//! applies finished requests to the mesh. Spawning and cancelling the
//! requests is left to [`crate::LookaroundAdapter`].

use std::fmt;

use lookaround_config::RefreshConfig;
use lookaround_mesh::{FACE_COUNT, FaceIndex, FaceSet};
use lookaround_tiles::{FaceTexture, FetchError, PanoramaRef, ResolutionTier};
use tracing::{debug, warn};

use crate::mesh::PanoMesh;

/// Identifies one issued refresh request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    /// A request for a sharper tier is outstanding.
    Refreshing { request: RequestId },
}

/// What is known about one face of the installed panorama.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceRecord {
    /// Tier currently displayed.
    pub tier: ResolutionTier,
    /// Panorama the displayed texture came from.
    pub panorama: PanoramaRef,
    /// Whether a sharper tier is being fetched.
    pub state: LoadState,
}

/// Records for all six faces of one panorama.
#[derive(Clone, Debug)]
pub struct FaceTable {
    panorama: PanoramaRef,
    records: [FaceRecord; FACE_COUNT],
}

impl FaceTable {
    /// Fresh table for a just-installed set of textures. Every face is idle.
    pub fn from_textures(panorama: PanoramaRef, textures: &[FaceTexture; FACE_COUNT]) -> Self {
        Self {
            panorama,
            records: textures.each_ref().map(|t| FaceRecord {
                tier: t.tier,
                panorama,
                state: LoadState::Idle,
            }),
        }
    }

    pub fn panorama(&self) -> PanoramaRef {
        self.panorama
    }

    pub fn record(&self, face: FaceIndex) -> &FaceRecord {
        &self.records[face.index()]
    }

    fn record_mut(&mut self, face: FaceIndex) -> &mut FaceRecord {
        &mut self.records[face.index()]
    }

    /// Faces with a request outstanding.
    pub fn refreshing(&self) -> FaceSet {
        FaceIndex::ALL
            .into_iter()
            .filter(|f| matches!(self.record(*f).state, LoadState::Refreshing { .. }))
            .collect()
    }
}

/// A request the controller decided to issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    /// Id matched against the face record on completion.
    pub request: RequestId,
    /// Face to fetch.
    pub face: FaceIndex,
    /// Tier to fetch it at.
    pub tier: ResolutionTier,
    /// Panorama that was live when the request was issued.
    pub panorama: PanoramaRef,
}

/// A finished request, successful or not.
#[derive(Debug)]
pub struct RefreshCompletion {
    /// Request this result answers.
    pub ticket: RefreshTicket,
    /// Fetched texture or the reason it could not be fetched.
    pub result: Result<FaceTexture, FetchError>,
}

/// What applying a completion did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The sharper texture is now displayed.
    Installed {
        face: FaceIndex,
        tier: ResolutionTier,
    },
    /// The result belonged to a panorama or request that is no longer current.
    Discarded { face: FaceIndex },
    /// The fetch failed; the face keeps its previous texture.
    Failed { face: FaceIndex },
}

/// Decides which faces to upgrade and applies the results.
#[derive(Debug)]
pub struct RefreshController {
    config: RefreshConfig,
    table: Option<FaceTable>,
    next_request: u64,
}

impl RefreshController {
    pub fn new(config: RefreshConfig) -> Self {
        Self {
            config,
            table: None,
            next_request: 0,
        }
    }

    /// Replace the table, e.g. after a new panorama was installed.
    pub fn install_table(&mut self, table: FaceTable) {
        self.table = Some(table);
    }

    pub fn table(&self) -> Option<&FaceTable> {
        self.table.as_ref()
    }

    /// Panorama of the installed table.
    pub fn panorama(&self) -> Option<PanoramaRef> {
        self.table.as_ref().map(FaceTable::panorama)
    }

    /// Fine tier below the fov threshold, medium tier otherwise.
    pub fn target_tier(&self, vertical_fov_deg: f32) -> ResolutionTier {
        if vertical_fov_deg < self.config.fine_fov_threshold_deg {
            ResolutionTier(self.config.fine_tier)
        } else {
            ResolutionTier(self.config.medium_tier)
        }
    }

    /// Mark every visible face that is idle and coarser than `target` as
    /// refreshing and return one ticket per such face.
    pub fn plan(&mut self, visible: FaceSet, target: ResolutionTier) -> Vec<RefreshTicket> {
        let Some(table) = self.table.as_mut() else {
            return Vec::new();
        };

        let mut tickets = Vec::new();
        for face in visible.iter() {
            let record = table.record_mut(face);
            if record.state != LoadState::Idle || record.tier <= target {
                continue;
            }

            let request = RequestId(self.next_request);
            self.next_request += 1;
            record.state = LoadState::Refreshing { request };
            tickets.push(RefreshTicket {
                request,
                face,
                tier: target,
                panorama: record.panorama,
            });
        }
        tickets
    }

    /// Apply a finished request.
    ///
    /// The face returns to idle if the request is still the one it waits on.
    /// The texture is installed only if `live` is still the panorama the
    /// request was issued for and it is sharper than what is displayed.
    pub fn complete(
        &mut self,
        live: Option<PanoramaRef>,
        mesh: &mut PanoMesh,
        completion: RefreshCompletion,
    ) -> RefreshOutcome {
        let RefreshCompletion { ticket, result } = completion;
        let face = ticket.face;

        let Some(table) = self
            .table
            .as_mut()
            .filter(|t| t.panorama == ticket.panorama)
        else {
            debug!(face = face.index(), request = %ticket.request, "refresh for replaced panorama dropped");
            return RefreshOutcome::Discarded { face };
        };

        let record = table.record_mut(face);
        if record.state != (LoadState::Refreshing { request: ticket.request }) {
            debug!(face = face.index(), request = %ticket.request, "superseded refresh dropped");
            return RefreshOutcome::Discarded { face };
        }
        record.state = LoadState::Idle;

        if live != Some(ticket.panorama) {
            debug!(
                face = face.index(),
                panorama = %ticket.panorama,
                "stale refresh dropped"
            );
            return RefreshOutcome::Discarded { face };
        }

        let texture = match result {
            Ok(texture) => texture,
            Err(err) => {
                warn!(
                    face = face.index(),
                    tier = ticket.tier.value(),
                    "refresh failed: {err}"
                );
                return RefreshOutcome::Failed { face };
            }
        };

        if texture.tier >= record.tier {
            return RefreshOutcome::Discarded { face };
        }

        let tier = texture.tier;
        record.tier = tier;
        mesh.install(texture);
        debug!(face = face.index(), tier = tier.value(), "refreshed face installed");
        RefreshOutcome::Installed { face, tier }
    }

    /// Return every refreshing face to idle. Yields the abandoned requests.
    pub fn cancel_in_flight(&mut self) -> Vec<RequestId> {
        let Some(table) = self.table.as_mut() else {
            return Vec::new();
        };
        let mut cancelled = Vec::new();
        for record in &mut table.records {
            if let LoadState::Refreshing { request } = record.state {
                cancelled.push(request);
                record.state = LoadState::Idle;
            }
        }
        cancelled
    }
}

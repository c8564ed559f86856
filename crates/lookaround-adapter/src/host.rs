//! What the adapter needs from the viewer, and what the viewer tells it.

use lookaround_frustum::CameraState;

/// Services the hosting viewer provides.
pub trait ViewerHost {
    /// Current committed camera.
    fn camera(&self) -> CameraState;

    /// Ask for a redraw after a texture changed.
    fn request_render(&self);

    /// Progress of the initial load, `0..=1`.
    fn set_progress(&self, _progress: f32) {}
}

/// Viewer events that may change which faces need a sharper texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewerEvent {
    /// The camera finished moving.
    PositionUpdated,
    /// The field of view changed.
    ZoomUpdated,
    /// An animated rotation started towards `yaw` (radians).
    RotationStarted { yaw: f32 },
}

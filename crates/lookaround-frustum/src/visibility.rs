//! Face visibility by sparse proxy sampling.

use lookaround_mesh::{FaceSet, PanoGeometry};

use crate::camera::CameraState;
use crate::frustum::ScreenFrustum;

/// Every n-th proxy vertex is tested unless configured otherwise.
pub const DEFAULT_SAMPLE_STRIDE: usize = 20;

/// Faces with at least one sampled proxy vertex inside the camera frustum.
///
/// A face is reported only if a real vertex of it is in view. Slivers that
/// fall between samples may be missed.
pub fn visible_faces(
    geometry: &PanoGeometry,
    camera: &CameraState,
    pending_yaw: Option<f32>,
    stride: usize,
) -> FaceSet {
    let frustum = ScreenFrustum::from_camera(camera, pending_yaw);
    geometry
        .proxies
        .iter()
        .filter(|proxy| {
            proxy
                .positions
                .iter()
                .step_by(stride.max(1))
                .any(|p| frustum.contains_point(*p))
        })
        .map(|proxy| proxy.face)
        .collect()
}

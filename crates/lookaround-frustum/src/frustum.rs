//! Frustum planes extracted from a view-projection matrix.

use glam::{Mat4, Vec3, Vec4};

use crate::camera::CameraState;

const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Six inward-facing planes.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far. `(a, b, c)` is the unit inward
    /// normal and `d` the offset.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Griggs-Hartmann extraction for a `0..1` depth range.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[2];
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Whether `point` lies on the inner side of every plane.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }

    /// The planes in left, right, bottom, top, near, far order.
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }
}

/// Frustum of the viewer camera for one refresh pass.
#[derive(Clone, Debug)]
pub struct ScreenFrustum {
    frustum: Frustum,
    yaw: f32,
}

impl ScreenFrustum {
    /// Build from the camera, using `pending_yaw` in place of the committed
    /// yaw when a rotation has started but not landed.
    pub fn from_camera(camera: &CameraState, pending_yaw: Option<f32>) -> Self {
        let yaw = pending_yaw.unwrap_or(camera.yaw);
        Self {
            frustum: Frustum::from_view_projection(&camera.view_projection(yaw)),
            yaw,
        }
    }

    /// Yaw the frustum was built with.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Whether `point` is in view.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.frustum.contains_point(point)
    }

    /// Underlying planes.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }
}

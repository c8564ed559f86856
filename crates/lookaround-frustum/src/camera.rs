//! Viewer camera orientation.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

/// Pitch is held this far short of straight up or down.
pub const MAX_PITCH: f32 = FRAC_PI_2 - 1.0e-3;

/// Orientation and lens of the viewer camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// Rotation about +Y in radians. Zero looks along +Z.
    pub yaw: f32,
    /// Elevation in radians, positive looks up.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub vertical_fov_deg: f32,
    /// Viewport width over height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            vertical_fov_deg: 65.0,
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 2.0 * 10.0,
        }
    }
}

impl CameraState {
    /// Camera looking at `yaw`/`pitch` with the default lens.
    pub fn looking(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch,
            ..Self::default()
        }
    }

    /// Same camera with a different vertical field of view.
    #[must_use]
    pub fn with_fov(mut self, vertical_fov_deg: f32) -> Self {
        self.vertical_fov_deg = vertical_fov_deg;
        self
    }

    /// Same camera with a different aspect ratio.
    #[must_use]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Unit view direction for `yaw` and the (clamped) pitch.
    pub fn direction(&self, yaw: f32) -> Vec3 {
        let pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        let (sin_y, cos_y) = yaw.sin_cos();
        let (sin_p, cos_p) = pitch.sin_cos();
        Vec3::new(-cos_p * sin_y, sin_p, cos_p * cos_y)
    }

    /// Combined view-projection matrix, depth mapped to `0..1`.
    pub fn view_projection(&self, yaw: f32) -> Mat4 {
        let view = Mat4::look_to_rh(Vec3::ZERO, self.direction(yaw), Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.vertical_fov_deg.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.near,
            self.far,
        );
        proj * view
    }
}

/// Yaw that turns the camera to face `point` horizontally.
pub fn yaw_towards(point: Vec3) -> f32 {
    (-point.x).atan2(point.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_zero_yaw_looks_along_z() {
        let dir = CameraState::default().direction(0.0);
        assert!((dir - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_direction_is_unit() {
        let camera = CameraState::looking(1.2, -0.4);
        assert!((camera.direction(camera.yaw).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_towards_inverts_direction() {
        for yaw in [-2.5_f32, -PI / 2.0, 0.3, 1.9] {
            let dir = CameraState::default().direction(yaw);
            assert!((yaw_towards(dir) - yaw).abs() < 1e-5);
        }
    }

    #[test]
    fn test_pitch_clamped_short_of_pole() {
        let camera = CameraState::looking(0.0, PI);
        let dir = camera.direction(0.0);
        assert!(dir.y < 1.0);
        assert!(dir.is_finite());
        assert!(camera.view_projection(0.0).is_finite());
    }

    #[test]
    fn test_builders() {
        let camera = CameraState::looking(0.5, 0.1).with_fov(30.0).with_aspect(1.0);
        assert_eq!(camera.vertical_fov_deg, 30.0);
        assert_eq!(camera.aspect, 1.0);
        assert_eq!(camera.far, 20.0);
    }
}

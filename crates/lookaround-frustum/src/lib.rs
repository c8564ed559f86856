//! Which panorama faces the camera can currently see.
//!
//! The viewer camera sits at the sphere centre. Its frustum is rebuilt from
//! yaw, pitch and field of view on every refresh and tested against a sparse
//! sample of each face's proxy vertices. Nothing here keeps state between
//! calls.

mod camera;
mod frustum;
mod visibility;

pub use camera::{CameraState, MAX_PITCH, yaw_towards};
pub use frustum::{Frustum, ScreenFrustum};
pub use visibility::{DEFAULT_SAMPLE_STRIDE, visible_faces};

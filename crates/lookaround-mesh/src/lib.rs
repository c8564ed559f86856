//! Panorama geometry: the non-uniform partial sphere of a four-camera rig.
//!
//! Each capture camera maps to one angular sector ("face"). Side faces have
//! unequal widths and carry overlap with their neighbours, which is hidden
//! by trimming U instead of cropping tiles. Caps are described but only
//! merged on request.

mod face;
mod geometry;
mod sector;

pub use face::{
    FACE_COUNT, FaceDescriptor, FaceIndex, FaceKind, FaceSet, NARROW_FACE_TRIM, WIDE_FACE_TRIM,
    lookaround_faces,
};
pub use geometry::{FaceProxy, GeometryGroup, MergedGeometry, PanoGeometry, PanoVertex};
pub use sector::{FaceGeometry, build_face};

/// Radius of the viewer's panorama sphere at scale 1.
pub const SPHERE_RADIUS: f32 = 10.0;

//! The panorama mesh and its six material slots.

use lookaround_mesh::{FACE_COUNT, FaceIndex, PanoGeometry};
use lookaround_tiles::{FaceTexture, PanoramaRef, ResolutionTier};

/// Material of one face slot.
#[derive(Clone, Debug)]
pub struct FaceMaterial {
    /// Texture currently displayed, if any.
    pub texture: Option<FaceTexture>,
    /// Opacity in `0..=1`, kept across texture swaps.
    pub opacity: f32,
    /// Set whenever `opacity < 1`.
    pub transparent: bool,
}

impl Default for FaceMaterial {
    fn default() -> Self {
        Self {
            texture: None,
            opacity: 1.0,
            transparent: false,
        }
    }
}

/// Geometry of one panorama plus a material per face.
///
/// There are always six slots, whether or not the caps carry geometry.
#[derive(Clone, Debug)]
pub struct PanoMesh {
    geometry: PanoGeometry,
    materials: [FaceMaterial; FACE_COUNT],
}

impl PanoMesh {
    pub fn new(geometry: PanoGeometry) -> Self {
        Self {
            geometry,
            materials: Default::default(),
        }
    }

    pub fn geometry(&self) -> &PanoGeometry {
        &self.geometry
    }

    pub fn material(&self, face: FaceIndex) -> &FaceMaterial {
        &self.materials[face.index()]
    }

    pub fn materials(&self) -> &[FaceMaterial; FACE_COUNT] {
        &self.materials
    }

    /// Display `texture` in its face's slot. The slot keeps its opacity.
    pub fn install(&mut self, texture: FaceTexture) {
        let slot = texture.face.index();
        self.materials[slot].texture = Some(texture);
    }

    /// Set the opacity of every slot.
    pub fn set_opacity(&mut self, opacity: f32) {
        for material in &mut self.materials {
            material.opacity = opacity;
            material.transparent = opacity < 1.0;
        }
    }

    /// Tier of the texture displayed on `face`.
    pub fn displayed_tier(&self, face: FaceIndex) -> Option<ResolutionTier> {
        self.material(face).texture.as_ref().map(|t| t.tier)
    }

    /// Panorama the texture on `face` belongs to.
    pub fn displayed_panorama(&self, face: FaceIndex) -> Option<PanoramaRef> {
        self.material(face).texture.as_ref().map(|t| t.panorama)
    }
}

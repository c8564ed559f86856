//! Merged panorama geometry with per-face material groups and visibility proxies.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use lookaround_config::MeshConfig;
use tracing::{debug, info};

use crate::face::{FaceDescriptor, FaceIndex, FaceKind, lookaround_faces};
use crate::sector::{FaceGeometry, build_face};

/// Interleaved vertex layout for GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PanoVertex {
    /// Position on the sphere.
    pub position: [f32; 3],
    /// Inward unit normal.
    pub normal: [f32; 3],
    /// Texture coordinate in the face's own tile.
    pub uv: [f32; 2],
}

/// A contiguous index range drawn with one face's material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryGroup {
    /// First index of the range.
    pub start: u32,
    /// Number of indices in the range.
    pub count: u32,
    /// Material slot used for the range.
    pub face: FaceIndex,
}

/// All enabled faces concatenated into one buffer.
#[derive(Clone, Debug, Default)]
pub struct MergedGeometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Inward unit normals.
    pub normals: Vec<Vec3>,
    /// Texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices into the merged vertex arrays.
    pub indices: Vec<u32>,
    /// One group per merged face, in merge order.
    pub groups: Vec<GeometryGroup>,
}

impl MergedGeometry {
    fn append(&mut self, face: FaceGeometry) {
        let base = self.positions.len() as u32;
        let start = self.indices.len() as u32;

        self.positions.extend_from_slice(&face.positions);
        self.normals.extend_from_slice(&face.normals);
        self.uvs.extend_from_slice(&face.uvs);
        self.indices.extend(face.indices.iter().map(|&i| i + base));

        self.groups.push(GeometryGroup {
            start,
            count: face.indices.len() as u32,
            face: face.face,
        });
    }

    /// Interleave positions, normals and UVs for upload.
    pub fn vertices(&self) -> Vec<PanoVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((p, n), uv)| PanoVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: *uv,
            })
            .collect()
    }

    /// Index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Positions of one face, kept apart from the merged buffer for visibility tests.
#[derive(Clone, Debug)]
pub struct FaceProxy {
    /// Face these positions belong to.
    pub face: FaceIndex,
    /// Same vertices as the face's slice of the merged buffer.
    pub positions: Vec<Vec3>,
}

/// Geometry of one panorama: merged render buffer plus visibility proxies.
#[derive(Clone, Debug)]
pub struct PanoGeometry {
    /// Sector layout, including faces that were not merged.
    pub descriptors: [FaceDescriptor; 6],
    /// Render buffer.
    pub merged: MergedGeometry,
    /// One proxy per merged face.
    pub proxies: Vec<FaceProxy>,
    /// Effective sphere radius (`radius * scale`).
    pub radius: f32,
}

impl PanoGeometry {
    /// Build the panorama sphere of `radius * scale`.
    ///
    /// Side faces are always merged; caps only when
    /// [`MeshConfig::polar_faces_enabled`] is set.
    pub fn build(radius: f32, scale: f32, config: &MeshConfig) -> Self {
        let radius = radius * scale;
        let descriptors = lookaround_faces(config.height_segments);
        let mut merged = MergedGeometry::default();
        let mut proxies = Vec::with_capacity(descriptors.len());

        for desc in descriptors.iter().filter(|d| is_enabled(d, config)) {
            let rotation = match desc.kind {
                FaceKind::Side => 0.0,
                FaceKind::TopCap => config.top_cap_rotation_deg,
                FaceKind::BottomCap => config.bottom_cap_rotation_deg,
            };
            let geom = build_face(desc, radius, rotation);
            debug!(
                face = desc.face.index(),
                vertices = geom.positions.len(),
                triangles = geom.indices.len() / 3,
                "built face geometry"
            );
            proxies.push(FaceProxy {
                face: desc.face,
                positions: geom.positions.clone(),
            });
            merged.append(geom);
        }

        info!(
            "Panorama geometry built: {} faces, {} vertices, {} triangles",
            merged.groups.len(),
            merged.positions.len(),
            merged.indices.len() / 3
        );

        Self {
            descriptors,
            merged,
            proxies,
            radius,
        }
    }

    /// Number of material groups in the merged buffer.
    pub fn group_count(&self) -> usize {
        self.merged.groups.len()
    }

    /// Proxy for `face`, if that face was merged.
    pub fn proxy(&self, face: FaceIndex) -> Option<&FaceProxy> {
        self.proxies.iter().find(|p| p.face == face)
    }
}

fn is_enabled(desc: &FaceDescriptor, config: &MeshConfig) -> bool {
    desc.kind == FaceKind::Side || config.polar_faces_enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SPHERE_RADIUS;

    fn polar_config() -> MeshConfig {
        MeshConfig {
            polar_faces_enabled: true,
            ..MeshConfig::default()
        }
    }

    #[test]
    fn test_default_merges_four_side_faces() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &MeshConfig::default());
        assert_eq!(geom.group_count(), 4);
        assert_eq!(geom.proxies.len(), 4);
        let faces: Vec<usize> = geom.merged.groups.iter().map(|g| g.face.index()).collect();
        assert_eq!(faces, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_polar_faces_merge_six() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &polar_config());
        assert_eq!(geom.group_count(), 6);
        assert!(geom.proxy(FaceIndex::BOTTOM).is_some());
    }

    #[test]
    fn test_descriptors_kept_when_caps_disabled() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &MeshConfig::default());
        assert_eq!(geom.descriptors[4].kind, FaceKind::TopCap);
        assert!(geom.proxy(FaceIndex::TOP).is_none());
    }

    #[test]
    fn test_groups_are_contiguous() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &polar_config());
        let mut expected_start = 0;
        for group in &geom.merged.groups {
            assert_eq!(group.start, expected_start);
            expected_start += group.count;
        }
        assert_eq!(expected_start as usize, geom.merged.indices.len());
    }

    #[test]
    fn test_merged_indices_in_range() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &polar_config());
        let n = geom.merged.positions.len() as u32;
        assert!(geom.merged.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_all_uvs_in_unit_square() {
        for config in [MeshConfig::default(), polar_config()] {
            let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &config);
            for uv in &geom.merged.uvs {
                assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
            }
        }
    }

    #[test]
    fn test_face_uvs_respect_trim() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &MeshConfig::default());
        let mut offset = 0;
        for proxy in &geom.proxies {
            let bound = geom.descriptors[proxy.face.index()].overlap_trim;
            let uvs = &geom.merged.uvs[offset..offset + proxy.positions.len()];
            assert!(uvs.iter().all(|uv| uv[0] <= bound));
            offset += proxy.positions.len();
        }
    }

    #[test]
    fn test_scale_multiplies_radius() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 2.0, &MeshConfig::default());
        assert_eq!(geom.radius, SPHERE_RADIUS * 2.0);
        let len = geom.merged.positions[0].length();
        assert!((len - SPHERE_RADIUS * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_proxies_match_merged_vertices() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &MeshConfig::default());
        let total: usize = geom.proxies.iter().map(|p| p.positions.len()).sum();
        assert_eq!(total, geom.merged.positions.len());
        assert_eq!(geom.proxies[1].positions[0], geom.merged.positions[geom.proxies[0].positions.len()]);
    }

    #[test]
    fn test_interleaved_vertices() {
        let geom = PanoGeometry::build(SPHERE_RADIUS, 1.0, &MeshConfig::default());
        let vertices = geom.merged.vertices();
        assert_eq!(vertices.len(), geom.merged.positions.len());
        assert_eq!(vertices[7].uv, geom.merged.uvs[7]);
        assert_eq!(std::mem::size_of::<PanoVertex>(), 32);
        assert_eq!(geom.merged.index_bytes().len(), geom.merged.indices.len() * 4);
    }
}

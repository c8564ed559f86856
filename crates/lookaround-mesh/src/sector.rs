//! Spherical sector tessellation and the per-face UV unwrapping.

use glam::{Quat, Vec3};

use crate::face::{FaceDescriptor, FaceIndex, FaceKind};

/// Geometry of a single face, seen from the sphere centre.
#[derive(Clone, Debug)]
pub struct FaceGeometry {
    /// Slot this geometry belongs to.
    pub face: FaceIndex,
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Unit normals pointing toward the sphere centre.
    pub normals: Vec<Vec3>,
    /// Texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices into this face's vertices.
    pub indices: Vec<u32>,
}

/// Tessellate one face on a sphere of `radius` and unwrap its UVs.
///
/// `cap_rotation_deg` rotates cap faces about +Y after unwrapping; it is
/// ignored for side faces.
pub fn build_face(desc: &FaceDescriptor, radius: f32, cap_rotation_deg: f32) -> FaceGeometry {
    let mut geom = tessellate(desc, radius);
    match desc.kind {
        FaceKind::Side => trim_side_uvs(&mut geom, desc.overlap_trim),
        FaceKind::TopCap | FaceKind::BottomCap => {
            planar_cap_uvs(&mut geom, desc.kind);
            rotate_about_y(&mut geom, cap_rotation_deg.to_radians());
        }
    }
    geom
}

/// Sphere-sector grid, mirrored on X so the surface faces inward.
///
/// Vertex `(ix, iy)` sits at `phi = phi_start + u * phi_length`,
/// `theta = theta_start + v * theta_length` with `u = ix / width`,
/// `v = iy / height`. Triangles touching a pole collapse and are skipped.
fn tessellate(desc: &FaceDescriptor, radius: f32) -> FaceGeometry {
    let width = desc.width_segments.max(1);
    let height = desc.height_segments.max(1);
    let phi_start = desc.phi_start.to_radians();
    let phi_length = desc.phi_length.to_radians();
    let theta_start = desc.theta_start.to_radians();
    let theta_length = desc.theta_length.to_radians();
    let starts_at_pole = desc.theta_start <= 0.0;
    let ends_at_pole = desc.theta_start + desc.theta_length >= 180.0;

    let vertex_count = desc.vertex_count();
    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for iy in 0..=height {
        let v = iy as f32 / height as f32;
        // Pole rows share one point; shift U half a cell so the fan samples the middle.
        let u_offset = if iy == 0 && starts_at_pole {
            0.5 / width as f32
        } else if iy == height && ends_at_pole {
            -0.5 / width as f32
        } else {
            0.0
        };
        let theta = theta_start + v * theta_length;

        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let phi = phi_start + u * phi_length;

            // Mirrored X: -(-r cos(phi) sin(theta)).
            let position = Vec3::new(
                radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            positions.push(position);
            normals.push(-position.normalize_or_zero());
            uvs.push([u + u_offset, 1.0 - v]);
        }
    }

    let row = width + 1;
    let mut indices = Vec::with_capacity((width * height * 6) as usize);
    for iy in 0..height {
        for ix in 0..width {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 || !starts_at_pole {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height - 1 || !ends_at_pole {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    FaceGeometry {
        face: desc.face,
        positions,
        normals,
        uvs,
        indices,
    }
}

/// Scale U so the duplicated strip along the right seam is never sampled.
///
/// Tiles carry overlap with their neighbours; trimming in UV space avoids
/// cropping every tile after download.
fn trim_side_uvs(geom: &mut FaceGeometry, overlap_trim: f32) {
    for uv in &mut geom.uvs {
        uv[0] *= overlap_trim;
    }
}

/// Planar projection of a cap onto its X/Z footprint.
///
/// Coordinates are normalised by the largest horizontal extent and
/// re-centred to `[0, 1]`. The bottom cap is viewed from above the opposite
/// side, so its U runs the other way.
fn planar_cap_uvs(geom: &mut FaceGeometry, kind: FaceKind) {
    let extent = geom
        .positions
        .iter()
        .fold(0.0_f32, |acc, p| acc.max(p.x.abs()).max(p.z.abs()));
    if extent <= 0.0 {
        return;
    }
    let u_sign = if kind == FaceKind::BottomCap { -1.0 } else { 1.0 };

    for (uv, p) in geom.uvs.iter_mut().zip(&geom.positions) {
        uv[0] = u_sign * p.x / (2.0 * extent) + 0.5;
        uv[1] = p.z / (2.0 * extent) + 0.5;
    }
}

fn rotate_about_y(geom: &mut FaceGeometry, angle: f32) {
    if angle == 0.0 {
        return;
    }
    let rotation = Quat::from_rotation_y(angle);
    for p in &mut geom.positions {
        *p = rotation * *p;
    }
    for n in &mut geom.normals {
        *n = rotation * *n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::{NARROW_FACE_TRIM, WIDE_FACE_TRIM, lookaround_faces};

    fn faces() -> [FaceDescriptor; 6] {
        lookaround_faces(32)
    }

    #[test]
    fn test_vertex_count_matches_grid() {
        for desc in faces() {
            let geom = build_face(&desc, 10.0, 0.0);
            assert_eq!(geom.positions.len(), desc.vertex_count());
            assert_eq!(geom.normals.len(), desc.vertex_count());
            assert_eq!(geom.uvs.len(), desc.vertex_count());
        }
    }

    #[test]
    fn test_vertices_on_sphere() {
        for desc in faces() {
            let geom = build_face(&desc, 10.0, 0.0);
            for p in &geom.positions {
                let len = p.length();
                assert!((len - 10.0).abs() < 1e-3, "vertex off sphere: {len}");
            }
        }
    }

    #[test]
    fn test_normals_point_inward() {
        let geom = build_face(&faces()[0], 10.0, 0.0);
        for (p, n) in geom.positions.iter().zip(&geom.normals) {
            assert!(p.dot(*n) < 0.0);
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_side_face_has_no_degenerate_rows() {
        let desc = faces()[1];
        let geom = build_face(&desc, 10.0, 0.0);
        let expected = (desc.width_segments * desc.height_segments * 6) as usize;
        assert_eq!(geom.indices.len(), expected);
    }

    #[test]
    fn test_cap_skips_pole_triangles() {
        let desc = faces()[4];
        let geom = build_face(&desc, 10.0, 0.0);
        let full = (desc.width_segments * desc.height_segments * 6) as usize;
        // One triangle per column is dropped at the pole row.
        assert_eq!(geom.indices.len(), full - desc.width_segments as usize * 3);
    }

    #[test]
    fn test_indices_in_range() {
        for desc in faces() {
            let geom = build_face(&desc, 10.0, 0.0);
            let n = geom.positions.len() as u32;
            assert!(geom.indices.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn test_wide_faces_trim_u() {
        for desc in [faces()[0], faces()[2]] {
            let geom = build_face(&desc, 10.0, 0.0);
            let max_u = geom.uvs.iter().map(|uv| uv[0]).fold(f32::MIN, f32::max);
            assert!(geom.uvs.iter().all(|uv| uv[0] >= 0.0 && uv[0] <= WIDE_FACE_TRIM));
            assert!((max_u - 21.0 / 22.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_narrow_faces_trim_u() {
        for desc in [faces()[1], faces()[3]] {
            let geom = build_face(&desc, 10.0, 0.0);
            let max_u = geom.uvs.iter().map(|uv| uv[0]).fold(f32::MIN, f32::max);
            assert!(geom.uvs.iter().all(|uv| uv[0] >= 0.0 && uv[0] <= NARROW_FACE_TRIM));
            assert!((max_u - 11.0 / 12.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_side_v_spans_full_range() {
        let geom = build_face(&faces()[0], 10.0, 0.0);
        assert_eq!(geom.uvs[0][1], 1.0);
        assert_eq!(geom.uvs[geom.uvs.len() - 1][1], 0.0);
    }

    #[test]
    fn test_cap_uvs_in_unit_square() {
        for desc in [faces()[4], faces()[5]] {
            let geom = build_face(&desc, 10.0, 0.0);
            for uv in &geom.uvs {
                assert!((0.0..=1.0).contains(&uv[0]), "u out of range: {}", uv[0]);
                assert!((0.0..=1.0).contains(&uv[1]), "v out of range: {}", uv[1]);
            }
        }
    }

    #[test]
    fn test_cap_centre_maps_to_uv_centre() {
        let geom = build_face(&faces()[4], 10.0, 0.0);
        // First row of the top cap collapses onto the pole.
        let uv = geom.uvs[0];
        assert!((uv[0] - 0.5).abs() < 1e-5);
        assert!((uv[1] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_only_bottom_cap_mirrors_u() {
        let top = build_face(&faces()[4], 10.0, 0.0);
        let bottom = build_face(&faces()[5], 10.0, 0.0);
        // U grows with X on every top vertex and against it on every bottom one.
        for (uv, p) in top.uvs.iter().zip(&top.positions) {
            assert!((uv[0] - 0.5) * p.x >= 0.0, "top cap mirrored at {p}");
        }
        for (uv, p) in bottom.uvs.iter().zip(&bottom.positions) {
            assert!((uv[0] - 0.5) * p.x <= 0.0, "bottom cap not mirrored at {p}");
        }
        assert!(top.uvs[top.uvs.len() - 1][0] > 0.5);
        assert!(bottom.uvs[0][0] < 0.5);
    }

    #[test]
    fn test_cap_rotation_moves_positions_not_uvs() {
        let desc = faces()[5];
        let plain = build_face(&desc, 10.0, 0.0);
        let rotated = build_face(&desc, 10.0, -62.5);
        assert_eq!(plain.uvs, rotated.uvs);
        assert!((plain.positions[0] - rotated.positions[0]).length() > 1.0);
        assert!((rotated.positions[0].length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_side_rotation_ignored() {
        let desc = faces()[0];
        let a = build_face(&desc, 10.0, 0.0);
        let b = build_face(&desc, 10.0, 45.0);
        assert_eq!(a.positions, b.positions);
    }
}

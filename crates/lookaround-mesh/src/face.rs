//! The six angular sectors of a Look Around capture and their descriptors.

use std::fmt;

/// Number of face slots a panorama always has.
pub const FACE_COUNT: usize = 6;

/// Index of one face, `0..6`.
///
/// Faces 0–3 are the side faces, one per capture camera. Faces 4 and 5 are
/// the top and bottom caps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceIndex(u8);

impl FaceIndex {
    /// All six faces in canonical order.
    pub const ALL: [FaceIndex; FACE_COUNT] = [
        FaceIndex(0),
        FaceIndex(1),
        FaceIndex(2),
        FaceIndex(3),
        FaceIndex(4),
        FaceIndex(5),
    ];

    /// The four side faces.
    pub const SIDES: [FaceIndex; 4] = [FaceIndex(0), FaceIndex(1), FaceIndex(2), FaceIndex(3)];

    /// Top cap.
    pub const TOP: FaceIndex = FaceIndex(4);

    /// Bottom cap.
    pub const BOTTOM: FaceIndex = FaceIndex(5);

    /// Returns `None` if `index` is not a valid face.
    pub fn new(index: usize) -> Option<Self> {
        (index < FACE_COUNT).then_some(Self(index as u8))
    }

    /// The face index as an array offset.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the two caps.
    #[must_use]
    pub fn is_polar(self) -> bool {
        self.0 >= 4
    }
}

impl fmt::Display for FaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of faces, stored as a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceSet(u8);

impl FaceSet {
    /// The empty set.
    pub const EMPTY: FaceSet = FaceSet(0);

    /// Adds a face. Returns `true` if it was not present.
    pub fn insert(&mut self, face: FaceIndex) -> bool {
        let bit = 1 << face.0;
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    /// Whether the face is in the set.
    #[must_use]
    pub fn contains(self, face: FaceIndex) -> bool {
        self.0 & (1 << face.0) != 0
    }

    /// Number of faces in the set.
    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set has no faces.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate faces in ascending order.
    pub fn iter(self) -> impl Iterator<Item = FaceIndex> {
        FaceIndex::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<FaceIndex> for FaceSet {
    fn from_iter<I: IntoIterator<Item = FaceIndex>>(iter: I) -> Self {
        let mut set = FaceSet::EMPTY;
        for face in iter {
            set.insert(face);
        }
        set
    }
}

/// How a face is UV-unwrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceKind {
    /// Latitude band strip; U is trimmed to hide the seam overlap.
    Side,
    /// Cap above the band, planar-mapped from X/Z. No vertex of this cap has
    /// its U mirrored; mirroring applies to the bottom cap as a whole.
    TopCap,
    /// Cap below the band, planar-mapped from X/Z with U mirrored.
    BottomCap,
}

/// Angular sector of one face. All angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceDescriptor {
    /// Slot this face occupies.
    pub face: FaceIndex,
    /// UV mapping rule.
    pub kind: FaceKind,
    /// Start of the horizontal sweep.
    pub phi_start: f32,
    /// Horizontal sweep.
    pub phi_length: f32,
    /// Start of the vertical sweep, measured down from +Y.
    pub theta_start: f32,
    /// Vertical sweep.
    pub theta_length: f32,
    /// Columns of quads.
    pub width_segments: u32,
    /// Rows of quads.
    pub height_segments: u32,
    /// Fraction of the U range kept after removing seam overlap.
    pub overlap_trim: f32,
}

/// Top of the side band.
const BAND_THETA_START: f32 = 28.0;
/// Height of the side band.
const BAND_THETA_LENGTH: f32 = 92.5;
/// Columns of the caps.
const CAP_WIDTH_SEGMENTS: u32 = 36 * 4;

/// Overlap kept by the 120° faces.
pub const WIDE_FACE_TRIM: f32 = 1.0 - 1.0 / 22.0;
/// Overlap kept by the 60° faces.
pub const NARROW_FACE_TRIM: f32 = 1.0 - 1.0 / 12.0;

impl FaceDescriptor {
    fn side(index: u8, phi_start: f32, phi_length: f32, height_segments: u32) -> Self {
        let wide = phi_length > 90.0;
        Self {
            face: FaceIndex(index),
            kind: FaceKind::Side,
            phi_start,
            phi_length,
            theta_start: BAND_THETA_START,
            theta_length: BAND_THETA_LENGTH,
            width_segments: if wide { 12 * 2 } else { 6 * 2 },
            height_segments,
            overlap_trim: if wide { WIDE_FACE_TRIM } else { NARROW_FACE_TRIM },
        }
    }

    fn cap(index: u8, kind: FaceKind, theta_start: f32, theta_length: f32, rows: u32) -> Self {
        Self {
            face: FaceIndex(index),
            kind,
            phi_start: 0.0,
            phi_length: 360.0,
            theta_start,
            theta_length,
            width_segments: CAP_WIDTH_SEGMENTS,
            height_segments: rows,
            overlap_trim: 1.0,
        }
    }

    /// Number of vertices the tessellated face has.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        (self.width_segments as usize + 1) * (self.height_segments as usize + 1)
    }
}

/// Sector layout of the four-camera rig plus the two caps.
///
/// Side faces alternate 120° and 60° wide, starting 90° left of the heading.
pub fn lookaround_faces(height_segments: u32) -> [FaceDescriptor; FACE_COUNT] {
    let band_end = BAND_THETA_START + BAND_THETA_LENGTH;
    [
        FaceDescriptor::side(0, 0.0 - 90.0, 120.0, height_segments),
        FaceDescriptor::side(1, 120.0 - 90.0, 60.0, height_segments),
        FaceDescriptor::side(2, 180.0 - 90.0, 120.0, height_segments),
        FaceDescriptor::side(3, 300.0 - 90.0, 60.0, height_segments),
        FaceDescriptor::cap(4, FaceKind::TopCap, 0.0, BAND_THETA_START, height_segments),
        FaceDescriptor::cap(
            5,
            FaceKind::BottomCap,
            band_end,
            180.0 - band_end,
            height_segments,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_index_bounds() {
        assert_eq!(FaceIndex::new(5), Some(FaceIndex::BOTTOM));
        assert_eq!(FaceIndex::new(6), None);
        assert!(FaceIndex::TOP.is_polar());
        assert!(!FaceIndex::SIDES[3].is_polar());
    }

    #[test]
    fn test_face_set_ops() {
        let mut set = FaceSet::EMPTY;
        assert!(set.is_empty());
        assert!(set.insert(FaceIndex::SIDES[2]));
        assert!(!set.insert(FaceIndex::SIDES[2]));
        set.insert(FaceIndex::SIDES[0]);
        assert_eq!(set.len(), 2);
        let faces: Vec<usize> = set.iter().map(FaceIndex::index).collect();
        assert_eq!(faces, vec![0, 2]);
    }

    #[test]
    fn test_side_faces_cover_full_circle() {
        let faces = lookaround_faces(32);
        let total: f32 = faces[..4].iter().map(|f| f.phi_length).sum();
        assert_eq!(total, 360.0);
        for pair in faces[..4].windows(2) {
            assert_eq!(pair[0].phi_start + pair[0].phi_length, pair[1].phi_start);
        }
    }

    #[test]
    fn test_widths_and_trim() {
        let faces = lookaround_faces(32);
        let widths: Vec<f32> = faces[..4].iter().map(|f| f.phi_length).collect();
        assert_eq!(widths, vec![120.0, 60.0, 120.0, 60.0]);
        assert!((faces[0].overlap_trim - 21.0 / 22.0).abs() < 1e-6);
        assert!((faces[1].overlap_trim - 11.0 / 12.0).abs() < 1e-6);
        assert_eq!(faces[0].width_segments, 24);
        assert_eq!(faces[3].width_segments, 12);
    }

    #[test]
    fn test_caps_close_the_sphere() {
        let faces = lookaround_faces(32);
        let top = faces[4];
        let bottom = faces[5];
        assert_eq!(top.theta_start + top.theta_length, faces[0].theta_start);
        assert_eq!(faces[0].theta_start + faces[0].theta_length, bottom.theta_start);
        assert_eq!(bottom.theta_start + bottom.theta_length, 180.0);
        assert_eq!(top.kind, FaceKind::TopCap);
        assert_eq!(bottom.kind, FaceKind::BottomCap);
    }
}

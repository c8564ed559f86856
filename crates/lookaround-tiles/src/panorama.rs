//! Panorama identity, resolution tiers and the tile URL scheme.

use std::fmt;
use std::str::FromStr;

use lookaround_mesh::FaceIndex;

use crate::error::ParsePanoramaError;

/// Identity of one panorama.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PanoramaRef {
    /// Panorama id.
    pub id: u64,
    /// Heading the panorama was captured at.
    pub heading: u64,
}

impl PanoramaRef {
    /// Reference to panorama `id` captured at `heading`.
    ///
    /// ```
    /// use lookaround_tiles::PanoramaRef;
    ///
    /// let pano = PanoramaRef::new(1234567890, 42);
    /// assert_eq!(pano.base_url(), "/pano/1234567890/42/");
    /// ```
    pub fn new(id: u64, heading: u64) -> Self {
        Self { id, heading }
    }

    /// Base path of the panorama's tiles, `/pano/{id}/{heading}/`.
    pub fn base_url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PanoramaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/pano/{}/{}/", self.id, self.heading)
    }
}

impl FromStr for PanoramaRef {
    type Err = ParsePanoramaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePanoramaError(s.to_string());
        let rest = s
            .strip_prefix("/pano/")
            .and_then(|r| r.strip_suffix('/'))
            .ok_or_else(err)?;
        let (id, heading) = rest.split_once('/').ok_or_else(err)?;
        Ok(Self {
            id: id.parse().map_err(|_| err())?,
            heading: heading.parse().map_err(|_| err())?,
        })
    }
}

/// Tile resolution tier. Lower is sharper, so `a <= b` means `a` is at
/// least as good as `b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolutionTier(pub u8);

impl ResolutionTier {
    /// Sharpest tier, used when zoomed in.
    pub const FINE: ResolutionTier = ResolutionTier(0);
    /// Tier for an unzoomed view.
    pub const MEDIUM: ResolutionTier = ResolutionTier(2);
    /// Tier of the first load of a panorama.
    pub const INITIAL: ResolutionTier = ResolutionTier(4);

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `{endpoint}/pano/{id}/{heading}/{tier}/{face}/`.
///
/// `endpoint` is prepended verbatim and should not end with a slash.
pub fn face_url(
    endpoint: &str,
    panorama: PanoramaRef,
    tier: ResolutionTier,
    face: FaceIndex,
) -> String {
    format!("{endpoint}{panorama}{tier}/{face}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_shape() {
        let pano = PanoramaRef::new(1234567890123, 5);
        assert_eq!(pano.base_url(), "/pano/1234567890123/5/");
    }

    #[test]
    fn test_parse_base_url() {
        let pano: PanoramaRef = "/pano/42/7/".parse().unwrap();
        assert_eq!(pano, PanoramaRef::new(42, 7));
        assert_eq!(pano.to_string().parse::<PanoramaRef>().unwrap(), pano);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["/pano/42/7", "pano/42/7/", "/pano/42/", "/pano/x/7/", "/pano/1/2/3/"] {
            assert!(bad.parse::<PanoramaRef>().is_err(), "{bad} parsed");
        }
    }

    #[test]
    fn test_face_url() {
        let url = face_url(
            "http://127.0.0.1:5000",
            PanoramaRef::new(42, 7),
            ResolutionTier::INITIAL,
            FaceIndex::SIDES[3],
        );
        assert_eq!(url, "http://127.0.0.1:5000/pano/42/7/4/3/");
    }

    #[test]
    fn test_tier_order() {
        assert!(ResolutionTier::FINE < ResolutionTier::MEDIUM);
        assert!(ResolutionTier::MEDIUM < ResolutionTier::INITIAL);
        assert!(ResolutionTier(2) <= ResolutionTier::MEDIUM);
    }
}

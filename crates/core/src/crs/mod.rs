//! Coordinate Reference System handling
//!
//! Layers and rasters only carry a CRS through the pipeline; nothing here
//! reprojects. Equivalence is needed to reject mismatched change-detection
//! inputs and to stamp output layers with the source reference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// Parse an authority string such as `EPSG:32630` or the OGC URN
    /// `urn:ogc:def:crs:EPSG::32630`. `CRS84` maps to EPSG:4326.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("CRS84") || name.ends_with(":CRS84") {
            return Some(Self::wgs84());
        }
        let upper = name.to_ascii_uppercase();
        let idx = upper.rfind("EPSG:")?;
        let code = upper[idx + 5..].trim_start_matches(':');
        code.parse().ok().map(Self::from_epsg)
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        // Textual comparison only; WKT dialects are not normalised
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt.char_indices().nth(50).map(|(i, _)| i).unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(32630);
        assert_eq!(crs.epsg(), Some(32630));
        assert_eq!(crs.identifier(), "EPSG:32630");
    }

    #[test]
    fn test_parse_authority_strings() {
        assert_eq!(CRS::parse("EPSG:32630"), Some(CRS::from_epsg(32630)));
        assert_eq!(
            CRS::parse("urn:ogc:def:crs:EPSG::3857"),
            Some(CRS::from_epsg(3857))
        );
        assert_eq!(
            CRS::parse("urn:ogc:def:crs:OGC:1.3:CRS84"),
            Some(CRS::wgs84())
        );
        assert_eq!(CRS::parse("local grid"), None);
    }

    #[test]
    fn test_crs_equivalence() {
        assert!(CRS::from_epsg(4326).is_equivalent(&CRS::wgs84()));
        assert!(!CRS::from_epsg(4326).is_equivalent(&CRS::from_epsg(32630)));
        // No shared representation: not provably equivalent
        assert!(!CRS::from_epsg(4326).is_equivalent(&CRS::from_wkt("GEOGCS[...]")));
    }
}

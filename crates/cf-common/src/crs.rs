//! CF grid mapping for the coordinate reference systems we write.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attrs::Attributes;
use crate::error::CfError;

/// WKT2 (2019) rendering of EPSG:4326.
const EPSG_4326_WKT: &str = concat!(
    "GEOGCRS[\"WGS 84\",",
    "ENSEMBLE[\"World Geodetic System 1984 ensemble\",",
    "MEMBER[\"World Geodetic System 1984 (Transit)\"],",
    "MEMBER[\"World Geodetic System 1984 (G730)\"],",
    "MEMBER[\"World Geodetic System 1984 (G873)\"],",
    "MEMBER[\"World Geodetic System 1984 (G1150)\"],",
    "MEMBER[\"World Geodetic System 1984 (G1674)\"],",
    "MEMBER[\"World Geodetic System 1984 (G1762)\"],",
    "MEMBER[\"World Geodetic System 1984 (G2139)\"],",
    "ELLIPSOID[\"WGS 84\",6378137,298.257223563,LENGTHUNIT[\"metre\",1]],",
    "ENSEMBLEACCURACY[2.0]],",
    "PRIMEM[\"Greenwich\",0,ANGLEUNIT[\"degree\",0.0174532925199433]],",
    "CS[ellipsoidal,2],",
    "AXIS[\"geodetic latitude (Lat)\",north,ORDER[1],ANGLEUNIT[\"degree\",0.0174532925199433]],",
    "AXIS[\"geodetic longitude (Lon)\",east,ORDER[2],ANGLEUNIT[\"degree\",0.0174532925199433]],",
    "USAGE[SCOPE[\"Horizontal component of 3D system.\"],AREA[\"World.\"],BBOX[-90,-180,90,180]],",
    "ID[\"EPSG\",4326]]"
);

/// Name of the grid-mapping variable every field points at.
pub const GRID_MAPPING_VARIABLE: &str = "latlon_grid";

/// Supported coordinate reference systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
}

impl CrsCode {
    /// CF grid-mapping attributes, in the order pyproj-style exporters emit them.
    pub fn cf_attributes(&self) -> Attributes {
        match self {
            CrsCode::Epsg4326 => Attributes::new()
                .with("crs_wkt", EPSG_4326_WKT)
                .with("semi_major_axis", 6378137.0)
                .with("semi_minor_axis", 6356752.314245179)
                .with("inverse_flattening", 298.257223563)
                .with("reference_ellipsoid_name", "WGS 84")
                .with("longitude_of_prime_meridian", 0.0)
                .with("prime_meridian_name", "Greenwich")
                .with("geographic_crs_name", "WGS 84")
                .with("horizontal_datum_name", "World Geodetic System 1984 ensemble")
                .with("grid_mapping_name", "latitude_longitude"),
        }
    }
}

impl FromStr for CrsCode {
    type Err = CfError;

    /// Accepts "EPSG:4326", "epsg:4326", "CRS:84" and the bare code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" | "4326" => Ok(CrsCode::Epsg4326),
            _ => Err(CfError::UnsupportedCrs(s.to_string())),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
        };
        write!(f, "{}", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!("epsg:4326".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert_eq!("CRS:84".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert!("EPSG:3857".parse::<CrsCode>().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_cf_attributes() {
        let attrs = CrsCode::Epsg4326.cf_attributes();
        assert_eq!(attrs.get_str("grid_mapping_name"), Some("latitude_longitude"));
        assert_eq!(
            attrs.get("inverse_flattening").and_then(|v| v.as_f64()),
            Some(298.257223563)
        );
        assert!(attrs.get_str("crs_wkt").unwrap().ends_with("ID[\"EPSG\",4326]]"));
    }
}

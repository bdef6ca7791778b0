//! CF, ACDD and CM SAF attributes of sample files.
//!
//! Two attribute profiles exist: the current GERDA layout and the legacy
//! CDOP-3 flat file. Everything derived from data (geospatial and temporal
//! coverage) is computed from the coordinate bounds; `date_created` is
//! passed in so callers control the clock.

use std::fmt;

use chrono::{DateTime, Utc};
use cf_common::time::format_cf_timestamp;
use cf_common::{AttrValue, Attributes, Coordinates, CrsCode, GRID_MAPPING_VARIABLE};
use serde::{Deserialize, Serialize};

use crate::aggregation::Aggregation;

/// Attribute profile of a sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Grouped GERDA layout.
    #[default]
    Gerda,
    /// Flat CDOP-3 layout.
    Cdop3,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Gerda => "gerda",
            Profile::Cdop3 => "cdop3",
        }
    }

    /// Scope named in the `record_status` comment.
    pub fn record_scope(&self) -> &'static str {
        match self {
            Profile::Gerda => "file/group",
            Profile::Cdop3 => "file",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Coordinates
// ============================================================================

pub fn time_attrs(profile: Profile) -> Attributes {
    let attrs = match profile {
        Profile::Gerda => Attributes::new().with("axis", "T"),
        Profile::Cdop3 => Attributes::new(),
    };
    attrs
        .with("bounds", "time_bounds")
        .with("long_name", "Time")
        .with("standard_name", "time")
}

pub fn lon_attrs(profile: Profile) -> Attributes {
    let attrs = match profile {
        Profile::Gerda => Attributes::new()
            .with("axis", "X")
            .with("bounds", "lon_bounds")
            .with("long_name", "longitude"),
        Profile::Cdop3 => Attributes::new()
            .with("bounds", "lon_bounds")
            .with("long_name", "Longitude"),
    };
    attrs
        .with("standard_name", "longitude")
        .with("units", "degrees_east")
}

pub fn lat_attrs(profile: Profile) -> Attributes {
    let attrs = match profile {
        Profile::Gerda => Attributes::new()
            .with("axis", "Y")
            .with("bounds", "lat_bounds")
            .with("long_name", "latitude"),
        Profile::Cdop3 => Attributes::new()
            .with("bounds", "lat_bounds")
            .with("long_name", "Latitude"),
    };
    attrs
        .with("standard_name", "latitude")
        .with("units", "degrees_north")
}

/// Attributes of a bounds variable; GERDA leaves them bare as CF suggests.
pub fn bounds_attrs(profile: Profile, coordinate: &str) -> Attributes {
    match profile {
        Profile::Gerda => Attributes::new(),
        Profile::Cdop3 => Attributes::new().with("long_name", format!("{} bounds", coordinate)),
    }
}

pub fn grid_mapping_attrs() -> Attributes {
    CrsCode::Epsg4326
        .cf_attributes()
        .with("long_name", "Regular lat-lon grid")
}

// ============================================================================
// Fields
// ============================================================================

fn with_cell_methods(attrs: Attributes, aggregation: Aggregation, variable: &str) -> Attributes {
    match aggregation.cell_methods(variable) {
        Some(methods) => attrs.with("cell_methods", methods),
        None => attrs,
    }
}

pub fn cfc_attrs(aggregation: Aggregation) -> Attributes {
    let attrs = Attributes::new()
        .with("ancillary_variables", "nobs quality")
        .with("long_name", "Daily Mean Cloud Fraction")
        .with("standard_name", "cloud_area_fraction")
        .with("units", "%")
        .with("grid_mapping", GRID_MAPPING_VARIABLE);
    with_cell_methods(attrs, aggregation, "cfc")
}

pub fn nobs_attrs(aggregation: Aggregation) -> Attributes {
    let attrs = Attributes::new()
        .with("long_name", "Number of Observations")
        .with("standard_name", "number_of_observations")
        .with("units", "1")
        .with("grid_mapping", GRID_MAPPING_VARIABLE);
    with_cell_methods(attrs, aggregation, "nobs")
}

pub fn quality_attrs(profile: Profile) -> Attributes {
    let attrs = Attributes::new()
        .with("flag_meanings", "good medium bad")
        .with("flag_values", AttrValue::UBytes(vec![0, 1, 2]))
        .with("long_name", "Quality");
    match profile {
        Profile::Gerda => attrs.with("grid_mapping", GRID_MAPPING_VARIABLE),
        Profile::Cdop3 => attrs,
    }
}

pub fn sis_attrs(aggregation: Aggregation) -> Attributes {
    let attrs = Attributes::new()
        .with("long_name", "Daily mean Surface Downwelling Shortwave Radiation")
        .with("standard_name", "surface_downwelling_shortwave_flux_in_air")
        .with("units", "W m-2")
        .with("grid_mapping", GRID_MAPPING_VARIABLE);
    with_cell_methods(attrs, aggregation, "sis")
}

// ============================================================================
// Global attributes
// ============================================================================

fn resolution_label(resolution: f64) -> String {
    if resolution == 1.0 {
        "1 degree".to_string()
    } else {
        format!("{} degrees", resolution)
    }
}

/// Geospatial and temporal coverage derived from the coordinate bounds.
struct Coverage {
    lat: (f64, f64),
    lon: (f64, f64),
    resolution: String,
    start: String,
    end: String,
}

impl Coverage {
    fn of(coords: &Coordinates) -> Self {
        let (start, end) = coords
            .time_coverage()
            .map(|(s, e)| (format_cf_timestamp(&s), format_cf_timestamp(&e)))
            .unwrap_or_default();
        Self {
            lat: coords.lat_extent(),
            lon: coords.lon_extent(),
            resolution: resolution_label(coords.resolution),
            start,
            end,
        }
    }
}

/// Global attributes of a GERDA sample file.
pub fn gerda_global_attrs(coords: &Coordinates, created: DateTime<Utc>) -> Attributes {
    let cov = Coverage::of(coords);
    Attributes::new()
        .with("Conventions", "CF-1.12,ACDD-1.3")
        .with("creator_email", "contact.cmsaf@dwd.de")
        .with("creator_name", "DE/DWD")
        .with("creator_url", "https://cm-saf.eumetsat.int/")
        .with("date_created", format_cf_timestamp(&created))
        .with("geospatial_lat_max", cov.lat.1)
        .with("geospatial_lat_min", cov.lat.0)
        .with("geospatial_lat_resolution", cov.resolution.clone())
        .with("geospatial_lat_units", "degrees_north")
        .with("geospatial_lon_max", cov.lon.1)
        .with("geospatial_lon_min", cov.lon.0)
        .with("geospatial_lon_resolution", cov.resolution)
        .with("geospatial_lon_units", "degrees_east")
        .with("id", "DOI:10.5676/EUM_SAF_CM/GERDA/V001")
        .with(
            "instrument",
            "SEVIRI > Spinning Enhanced Visible and Infrared Imager,\
             GOES-15 Imager > Geostationary Operational Environmental Satellite 15-Imager,\
             ABI > Advanced Baseline Imager,\
             AHI > Advanced Himawari Imager",
        )
        .with("instrument_vocabulary", "GCMD Instruments, Version 21.0")
        .with("institution", "EUMETSAT/CMSAF")
        .with(
            "keywords",
            "CLOUD PROPERTIES > CLOUD FRACTION,ATMOSPHERIC RADIATION > INCOMING SOLAR RADIATION",
        )
        .with("keywords_vocabulary", "GCMD Science Keywords, Version 21.0")
        .with("license", "https://creativecommons.org/licenses/by/4.0/")
        .with(
            "lineage",
            "prov:wasDerivedFrom <https://user.eumetsat.int/catalogue/EO:EUM:DAT:MSG:HRSEVIRI>, \
             <https://doi.org/10.24381/cds.bd0915c6>;",
        )
        .with(
            "platform",
            "Meteosat > METEOSAT-11,\
             GOES-15 > Geostationary Operational Environmental Satellite 15,\
             GOES-16 > Geostationary Operational Environmental Satellite 16,\
             Himawari > Himawari-8",
        )
        .with("platform_vocabulary", "GCMD Platforms, Version 21.0")
        .with("product_version", "1.0")
        .with(
            "project",
            "Satellite Application Facility on Climate Monitoring (CM SAF)",
        )
        .with("provider_vocabulary", "GCMD Providers, Version 21.0")
        .with("references", "https://doi.org/10.5676/EUM_SAF_CM/GERDA/V001")
        .with("source", "satellite")
        .with(
            "standard_name_vocabulary",
            "Standard Name Table (v90, 20 March 2025)",
        )
        .with(
            "summary",
            "The CM SAF GEoRing DAtaset (GERDA) provides atmospheric parameters derived \
             from geostationary satellites. It is a climate data record covering the time \
             period 2002-2024. Use cases include climate monitoring, climate model \
             evaluation etc.",
        )
        .with("time_coverage_duration", coords.frequency.coverage_duration())
        .with("time_coverage_end", cov.end)
        .with("time_coverage_resolution", coords.frequency.coverage_resolution())
        .with("time_coverage_start", cov.start)
        .with("title", "CM SAF GEoRing DAtaset (GERDA)")
        .with("variable_id", "/clouds/cfc,/radiation/sis")
        .with("CMSAF_processor", "gerda-1.0.0")
        .with(
            "CMSAF_repeat_cylces",
            "METEOSAT-11=96, GOES-15=8, GOES-16=96, Himawari-8=144",
        )
}

/// Global attributes of the legacy CDOP-3 sample file.
pub fn cdop3_global_attrs(coords: &Coordinates, created: DateTime<Utc>) -> Attributes {
    let cov = Coverage::of(coords);
    Attributes::new()
        .with("title", "CM SAF GEoRing DAtaset (GERDA)")
        .with(
            "summary",
            "The CM SAF GEoRing DAtaset (GERDA) provides atmospheric parameters derived \
             from geostationary satellites. The spatial/temporal coverage is 1 degree/1 day \
             from 2002-2020.",
        )
        .with("id", "DOI:10.5676/EUM_SAF_CM/GERDA/V001")
        .with("product_version", "1.0")
        .with("creator_name", "DE/DWD")
        .with("creator_email", "contact.cmsaf@dwd.de")
        .with("creator_url", "http://www.cmsaf.eu/")
        .with("institution", "EUMETSAT/CMSAF")
        .with(
            "project",
            "Satellite Application Facility on Climate Monitoring (CM SAF)",
        )
        .with("references", "http://dx.doi.org/10.5676/EUM_SAF_CM/GERDA/V001")
        .with("keywords_vocabulary", "GCMD Science Keywords, Version 8.6")
        .with("keywords", "CLOUD PROPERTIES > CLOUD FRACTION")
        .with("Conventions", "CF-1.7, ACDD-1.3")
        .with(
            "standard_name_vocabulary",
            "Standard Name Table (v57, 11 July 2018)",
        )
        .with("date_created", format_cf_timestamp(&created))
        .with("geospatial_lat_units", "degrees_north")
        .with("geospatial_lat_min", cov.lat.0)
        .with("geospatial_lat_max", cov.lat.1)
        .with("geospatial_lat_resolution", cov.resolution.clone())
        .with("geospatial_lon_units", "degrees_east")
        .with("geospatial_lon_min", cov.lon.0)
        .with("geospatial_lon_max", cov.lon.1)
        .with("geospatial_lon_resolution", cov.resolution)
        .with("time_coverage_start", cov.start)
        .with("time_coverage_end", cov.end)
        .with("time_coverage_resolution", coords.frequency.coverage_resolution())
        .with(
            "platform",
            "METEOSAT > METEOSAT-11, GOES > GOES-15, GOES > GOES-16, Himawari > Himawari-8",
        )
        .with("platform_vocabulary", "GCMD Platforms, Version 8.6")
        .with(
            "instrument",
            "SEVIRI > Spinning Enhanced Visible and Infrared Imager, \
             GOES-15 Imager > Geostationary Operational Environmental Satellite 15-Imager, \
             GOES-16 Imager > Geostationary Operational Environmental Satellite 16-Imager, \
             AHI > Advanced Himawari Imager",
        )
        .with("instrument_vocabulary", "GCMD Instruments, Version 8.6")
        .with("variable_id", "cfc_dm")
        .with("license", "https://creativecommons.org/licenses/by/4.0/")
        .with("CMSAF_processor", "gerda-1.0.0")
        .with("CMSAF_L2_processor", "gerda-l2-1.0.0")
        .with("CMSAF_L3_processor", "gerda-l3-1.0.0")
        .with(
            "CMSAF_repeat_cylces",
            "METEOSAT-11=96, GOES-15=8, GOES-16=96, Himawari-8=144",
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_common::{Frequency, GridSpec, TimeSpec};
    use chrono::TimeZone;

    fn coords(frequency: Frequency, end_hour: u32) -> Coordinates {
        let time = TimeSpec {
            start: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2020, 1, 1, end_hour, 0, 0).unwrap(),
            frequency,
        };
        Coordinates::build(&time, &GridSpec::global_one_degree()).unwrap()
    }

    #[test]
    fn test_coverage_from_bounds() {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let attrs = gerda_global_attrs(&coords(Frequency::Hourly, 23), created);
        assert_eq!(attrs.get("geospatial_lat_min"), Some(&AttrValue::Double(-90.0)));
        assert_eq!(attrs.get("geospatial_lon_max"), Some(&AttrValue::Double(180.0)));
        assert_eq!(attrs.get_str("time_coverage_start"), Some("2020-01-01T00:00:00Z"));
        assert_eq!(attrs.get_str("time_coverage_end"), Some("2020-01-02T00:00:00Z"));
        assert_eq!(attrs.get_str("time_coverage_resolution"), Some("P1H"));
        assert_eq!(attrs.get_str("time_coverage_duration"), Some("P1D"));
        assert_eq!(attrs.get_str("date_created"), Some("2025-06-01T12:00:00Z"));
        assert_eq!(attrs.get_str("geospatial_lat_resolution"), Some("1 degree"));
    }

    #[test]
    fn test_instrument_list_is_comma_separated() {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let attrs = gerda_global_attrs(&coords(Frequency::Daily, 0), created);
        let instrument = attrs.get_str("instrument").unwrap();
        assert_eq!(instrument.split(',').count(), 4);
        assert!(instrument.contains("Imager,GOES-15"));
    }

    #[test]
    fn test_legacy_profile_differences() {
        assert!(!time_attrs(Profile::Cdop3).contains("axis"));
        assert_eq!(time_attrs(Profile::Gerda).get_str("axis"), Some("T"));
        assert_eq!(
            bounds_attrs(Profile::Cdop3, "Longitude").get_str("long_name"),
            Some("Longitude bounds")
        );
        assert!(bounds_attrs(Profile::Gerda, "Longitude").is_empty());
        assert!(!quality_attrs(Profile::Cdop3).contains("grid_mapping"));
    }

    #[test]
    fn test_field_attrs_follow_aggregation() {
        assert!(cfc_attrs(Aggregation::Daily).contains("cell_methods"));
        assert!(!cfc_attrs(Aggregation::Instantaneous).contains("cell_methods"));
        assert_eq!(
            sis_attrs(Aggregation::Instantaneous).get_str("grid_mapping"),
            Some("latlon_grid")
        );
    }
}

//! Encoding tables of the GERDA and CDOP-3 sample files.

use std::collections::BTreeMap;

use cf_common::{DType, EncodingTable, QuantizeMode, VarEncoding, ROOT_GROUP};

use crate::fields::Product;
use crate::legacy::LEGACY_CFC;

pub const GERDA_TIME_UNITS: &str = "days since 2000-01-01T00:00:00Z";
pub const CDOP3_TIME_UNITS: &str = "days since 1980-01-01 00:00:00";
pub const CALENDAR: &str = "standard";

/// Coordinates and bounds as float64 without fill value, plus `record_status`.
fn coordinate_encodings(time_units: &str) -> BTreeMap<String, VarEncoding> {
    let f64_no_fill = || VarEncoding::new(DType::Float64).no_fill();
    let mut common = BTreeMap::new();
    common.insert("time".to_string(), f64_no_fill().time_units(time_units, CALENDAR));
    for name in ["time_bounds", "lon", "lon_bounds", "lat", "lat_bounds"] {
        common.insert(name.to_string(), f64_no_fill());
    }
    common.insert("record_status".to_string(), VarEncoding::new(DType::UInt8));
    common
}

/// Per-group encodings of a grouped GERDA file.
///
/// `cfc` keeps an absolute precision of 0.01 %. `sis` lies in `[0, 1]`, so
/// relative BitGroom quantization to two significant digits is safe.
pub fn gerda_encoding(products: &[Product]) -> EncodingTable {
    let mut table = EncodingTable::new();
    for product in products {
        let group = format!("/{}", product.as_str());
        match product {
            Product::Clouds => {
                table.insert(
                    &group,
                    "cfc",
                    VarEncoding::new(DType::Float32)
                        .least_significant_digit(2)
                        .zlib(),
                );
                table.insert(&group, "nobs", VarEncoding::new(DType::UInt8).zlib());
                table.insert(&group, "quality", VarEncoding::new(DType::UInt8).zlib());
            }
            Product::Radiation => {
                table.insert(
                    &group,
                    "sis",
                    VarEncoding::new(DType::Float32)
                        .significant_digits(2, QuantizeMode::BitGroom)
                        .zlib(),
                );
            }
        }
    }
    table.merge_common(&coordinate_encodings(GERDA_TIME_UNITS));
    table
}

/// Encodings of the flat CDOP-3 file.
pub fn cdop3_encoding() -> EncodingTable {
    let mut table = EncodingTable::new()
        .with(ROOT_GROUP, LEGACY_CFC, VarEncoding::new(DType::Float32).zlib())
        .with(ROOT_GROUP, "nobs", VarEncoding::new(DType::UInt8).zlib())
        .with(ROOT_GROUP, "quality", VarEncoding::new(DType::UInt8).zlib());
    table.merge_common(&coordinate_encodings(CDOP3_TIME_UNITS));
    table
}

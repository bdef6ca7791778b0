//! Tests for coordinate axes, bounds and time units.

use cf_common::grid::{bounds, time_bounds};
use cf_common::{Alignment, CfError, Coordinates, Frequency, GridSpec, TimeSpec, TimeUnits};
use chrono::{Duration, TimeZone, Utc};

fn hourly_day() -> TimeSpec {
    TimeSpec {
        start: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2020, 1, 1, 23, 0, 0).unwrap(),
        frequency: Frequency::Hourly,
    }
}

// ============================================================================
// Bounds containment
// ============================================================================

#[test]
fn test_left_bounds_start_at_value() {
    let values = [0.0, 1.0, 2.0];
    for (v, [lo, hi]) in values.iter().zip(bounds(&values, 1.0, Alignment::Left)) {
        assert_eq!(lo, *v);
        assert!(lo <= *v && *v <= hi);
    }
}

#[test]
fn test_center_bounds_midpoint_is_value() {
    let coords = Coordinates::build(&hourly_day(), &GridSpec::global_one_degree()).unwrap();
    for (v, [lo, hi]) in coords.lat.iter().zip(&coords.lat_bounds) {
        assert_eq!(*v, (lo + hi) / 2.0);
    }
    for (v, [lo, hi]) in coords.lon.iter().zip(&coords.lon_bounds) {
        assert!(lo <= v && v <= hi);
    }
}

#[test]
fn test_time_bounds_cover_one_period() {
    let coords = Coordinates::build(&hourly_day(), &GridSpec::global_one_degree()).unwrap();
    for (t, [lo, hi]) in coords.time.iter().zip(&coords.time_bounds) {
        assert_eq!(lo, t);
        assert_eq!(*hi - *lo, Duration::hours(1));
    }
}

#[test]
fn test_centered_time_bounds() {
    let t = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
    let [lo, hi] = time_bounds(&[t], Duration::days(1), Alignment::Center)[0];
    assert_eq!(lo, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(hi, Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap());
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_unknown_alignment_is_unsupported() {
    let err = "edge".parse::<Alignment>().unwrap_err();
    assert!(matches!(err, CfError::UnsupportedAlignment(_)));
}

#[test]
fn test_unknown_frequency_is_unsupported() {
    let err = "weekly".parse::<Frequency>().unwrap_err();
    assert!(matches!(err, CfError::UnsupportedFrequency(_)));
}

#[test]
fn test_inverted_time_range_is_empty_axis() {
    let mut spec = hourly_day();
    std::mem::swap(&mut spec.start, &mut spec.end);
    let err = Coordinates::build(&spec, &GridSpec::global_one_degree()).unwrap_err();
    assert!(matches!(err, CfError::EmptyAxis { .. }));
}

#[test]
fn test_small_grid() {
    let grid = GridSpec {
        lon_min: -1.0,
        lon_max: 1.0,
        lat_min: -1.0,
        lat_max: 1.0,
        resolution: 2.0,
    };
    let spec = TimeSpec {
        start: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        frequency: Frequency::Hourly,
    };
    let coords = Coordinates::build(&spec, &grid).unwrap();
    assert_eq!(coords.shape(), (1, 2, 2));
    assert_eq!(coords.lon, vec![-1.0, 1.0]);
    assert_eq!(coords.lat_extent(), (-2.0, 2.0));
}

// ============================================================================
// Serde
// ============================================================================

#[test]
fn test_time_spec_accepts_date_only() {
    let spec: TimeSpec =
        serde_yaml::from_str("start: 1980-01-01\nend: '1980-01-31'\nfrequency: D\n").unwrap();
    assert_eq!(spec.frequency, Frequency::Daily);
    assert_eq!(spec.end, Utc.with_ymd_and_hms(1980, 1, 31, 0, 0, 0).unwrap());
}

#[test]
fn test_time_units_encode_hours() {
    let units = TimeUnits::parse("hours since 2020-01-01T00:00:00Z").unwrap();
    let t = Utc.with_ymd_and_hms(2020, 1, 1, 6, 30, 0).unwrap();
    assert_eq!(units.encode(&t), 6.5);
}

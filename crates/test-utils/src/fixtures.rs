//! Common test fixtures: grids, time axes and a fixed creation timestamp.
//!
//! Grids are kept small so tests that write netCDF files stay fast.

use cf_common::{Frequency, GridSpec, TimeSpec};
use chrono::{DateTime, TimeZone, Utc};

/// Timestamp used as `date_created` so generated trees are reproducible.
pub fn fixed_created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

/// 2°×2° grid with cell centres at ±1°: two cells per axis.
pub fn tiny_grid() -> GridSpec {
    GridSpec {
        lon_min: -1.0,
        lon_max: 1.0,
        lat_min: -1.0,
        lat_max: 1.0,
        resolution: 2.0,
    }
}

/// Global 20° grid with cell centres on odd multiples of 10°.
pub fn coarse_global_grid() -> GridSpec {
    GridSpec {
        lon_min: -170.0,
        lon_max: 170.0,
        lat_min: -80.0,
        lat_max: 80.0,
        resolution: 20.0,
    }
}

/// A single hourly step at 2020-01-01T00:00Z.
pub fn single_hour() -> TimeSpec {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    TimeSpec {
        start: t0,
        end: t0,
        frequency: Frequency::Hourly,
    }
}

/// 2020-01-01 in 24 hourly steps.
pub fn hourly_day() -> TimeSpec {
    TimeSpec {
        start: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2020, 1, 1, 23, 0, 0).unwrap(),
        frequency: Frequency::Hourly,
    }
}

/// One daily step at 2020-01-01.
pub fn single_day() -> TimeSpec {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    TimeSpec {
        start: t0,
        end: t0,
        frequency: Frequency::Daily,
    }
}

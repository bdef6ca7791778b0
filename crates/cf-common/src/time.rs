//! Time axis construction and CF time units.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CfError, CfResult};

/// Timestamp format used for `date_created` and the time coverage attributes.
pub const CF_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Repetition rule of the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Hourly,
}

impl Frequency {
    /// Length of one period, which is also the width of a time cell.
    pub fn step(&self) -> Duration {
        match self {
            Frequency::Daily => Duration::days(1),
            Frequency::Hourly => Duration::hours(1),
        }
    }

    /// ISO 8601 duration for `time_coverage_resolution`.
    pub fn coverage_resolution(&self) -> &'static str {
        match self {
            Frequency::Daily => "P1D",
            Frequency::Hourly => "P1H",
        }
    }

    /// ISO 8601 duration for `time_coverage_duration`.
    ///
    /// Sample files always cover one day, either as one daily mean or as a
    /// day of hourly slots.
    pub fn coverage_duration(&self) -> &'static str {
        match self {
            Frequency::Daily | Frequency::Hourly => "P1D",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Hourly => "hourly",
        }
    }
}

impl FromStr for Frequency {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" | "P1D" => return Ok(Frequency::Daily),
            "h" | "H" | "P1H" | "PT1H" => return Ok(Frequency::Hourly),
            _ => {}
        }
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Frequency::Daily),
            "hourly" | "hour" => Ok(Frequency::Hourly),
            _ => Err(CfError::UnsupportedFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = CfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Enumerate `start..=end` at the given frequency.
///
/// Sub-second parts are dropped from `start` before stepping, and `end` is
/// inclusive when it falls on the rule.
pub fn time_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    freq: Frequency,
) -> CfResult<Vec<DateTime<Utc>>> {
    let start = start.trunc_subsecs(0);
    if end < start {
        return Err(CfError::empty_axis(
            "time",
            format!("end {} precedes start {}", end, start),
        ));
    }

    let step = freq.step();
    let mut times = Vec::new();
    let mut t = start;
    while t <= end {
        times.push(t);
        t += step;
    }
    Ok(times)
}

/// Parse an ISO 8601 timestamp, assuming UTC when no offset is given.
pub fn parse_timestamp(s: &str) -> CfResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(CfError::InvalidTime(s.to_string()))
}

/// Format a timestamp the way CM SAF global attributes expect.
pub fn format_cf_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(CF_TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter reading timestamps with [`parse_timestamp`], so config files
/// may write `2020-01-01` or `2020-01-01T23:00:00`.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_cf_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Unit part of a CF `"<unit> since <epoch>"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    /// Milliseconds per unit.
    pub fn millis(&self) -> i64 {
        match self {
            TimeUnit::Days => 86_400_000,
            TimeUnit::Hours => 3_600_000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Seconds => 1_000,
            TimeUnit::Milliseconds => 1,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "days" | "day" | "d" => Some(TimeUnit::Days),
            "hours" | "hour" | "h" => Some(TimeUnit::Hours),
            "minutes" | "minute" | "min" => Some(TimeUnit::Minutes),
            "seconds" | "second" | "s" | "sec" => Some(TimeUnit::Seconds),
            "milliseconds" | "millisecond" | "ms" => Some(TimeUnit::Milliseconds),
            _ => None,
        }
    }
}

/// Parsed CF time units, e.g. `days since 2000-01-01T00:00:00Z`.
///
/// The original string is kept so the `units` attribute round-trips verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
    raw: String,
}

impl TimeUnits {
    pub fn parse(units: &str) -> CfResult<Self> {
        let (unit, epoch) = units
            .split_once(" since ")
            .ok_or_else(|| CfError::invalid_time_units(units, "expected '<unit> since <epoch>'"))?;

        let unit = TimeUnit::parse(unit.trim())
            .ok_or_else(|| CfError::invalid_time_units(units, format!("unknown unit '{}'", unit)))?;
        let epoch = parse_timestamp(epoch)
            .map_err(|_| CfError::invalid_time_units(units, format!("bad epoch '{}'", epoch)))?;

        Ok(Self {
            unit,
            epoch,
            raw: units.to_string(),
        })
    }

    /// Offset of `t` from the epoch in this unit.
    pub fn encode(&self, t: &DateTime<Utc>) -> f64 {
        (*t - self.epoch).num_milliseconds() as f64 / self.unit.millis() as f64
    }

    /// Timestamp for an offset, rounded to the millisecond.
    pub fn decode(&self, value: f64) -> CfResult<DateTime<Utc>> {
        let out_of_range = || CfError::InvalidTime(format!("{} {}", value, self.raw));
        let millis = (value * self.unit.millis() as f64).round();
        if !(millis >= i64::MIN as f64 && millis < i64::MAX as f64) {
            return Err(out_of_range());
        }
        Duration::try_milliseconds(millis as i64)
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .ok_or_else(out_of_range)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_daily_range_is_inclusive() {
        let start = Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(1980, 1, 31, 0, 0, 0).unwrap();
        let times = time_range(start, end, Frequency::Daily).unwrap();
        assert_eq!(times.len(), 31);
        assert_eq!(times[30], end);
    }

    #[test]
    fn test_hourly_range_one_day() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 1, 1, 23, 0, 0).unwrap();
        let times = time_range(start, end, Frequency::Hourly).unwrap();
        assert_eq!(times.len(), 24);
        assert_eq!(times[23].hour(), 23);
    }

    #[test]
    fn test_single_step_range() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let times = time_range(start, start, Frequency::Daily).unwrap();
        assert_eq!(times, vec![start]);
    }

    #[test]
    fn test_end_before_start_is_empty_axis() {
        let start = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            time_range(start, end, Frequency::Daily),
            Err(CfError::EmptyAxis { .. })
        ));
    }

    #[test]
    fn test_frequency_keys() {
        assert_eq!("D".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("h".parse::<Frequency>().unwrap(), Frequency::Hourly);
        assert_eq!("HOURLY".parse::<Frequency>().unwrap(), Frequency::Hourly);
        let err = "monthly".parse::<Frequency>().unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_time_units_roundtrip() {
        let units = TimeUnits::parse("days since 2000-01-01T00:00:00Z").unwrap();
        assert_eq!(units.unit, TimeUnit::Days);
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
        let encoded = units.encode(&t);
        assert_eq!(encoded, 7305.5);
        assert_eq!(units.decode(encoded).unwrap(), t);
        assert_eq!(units.to_string(), "days since 2000-01-01T00:00:00Z");
    }

    #[test]
    fn test_time_units_space_separated_epoch() {
        let units = TimeUnits::parse("days since 1980-01-01 00:00:00").unwrap();
        assert_eq!(units.epoch, Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_rejects_offsets_beyond_calendar() {
        let units = TimeUnits::parse("days since 1970-01-01 00:00:00").unwrap();
        for value in [1.0e10, -1.0e10, 1.0e300, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(units.decode(value), Err(CfError::InvalidTime(_))),
                "{} should not decode",
                value
            );
        }
        let far = units.decode(1.0e6).unwrap();
        assert_eq!(far.year(), 4707);
    }

    #[test]
    fn test_time_units_rejects_garbage() {
        assert!(TimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(TimeUnits::parse("days after 2000-01-01").is_err());
    }

    #[test]
    fn test_format_cf_timestamp() {
        let t = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(format_cf_timestamp(&t), "2020-01-02T00:00:00Z");
    }
}

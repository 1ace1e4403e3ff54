use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Naive formats accepted for a local watermark, tried in order.
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatermarkError {
    #[error("Unable to parse watermark '{0}'")]
    Parse(String),

    #[error("Watermark is out of the representable range: {0}")]
    OutOfRange(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Lower bound of a "new or modified since" scan.
///
/// The value is compared against the `_ts` field of every document, so it is
/// always reduced to whole seconds since the Unix epoch before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Watermark {
    /// Calendar date-time without offset, read in the scan's reference zone.
    Local(NaiveDateTime),
    /// An absolute instant.
    Instant(DateTime<FixedOffset>),
    /// Seconds since the Unix epoch, used as-is.
    EpochSeconds(i64),
}

impl Watermark {
    /// Converts the watermark to epoch seconds.
    ///
    /// A local date-time is measured against the epoch expressed in the same
    /// zone (`local - epoch_in_zone`), which keeps the conversion monotonic in
    /// the local input. Fractional seconds round up so that `_ts >= W` keeps
    /// its meaning for integer timestamps.
    pub fn to_epoch_seconds(&self, reference: Tz) -> Result<i64, WatermarkError> {
        match self {
            Watermark::EpochSeconds(secs) => Ok(*secs),
            Watermark::Instant(instant) => {
                let secs = instant.timestamp();
                if instant.timestamp_subsec_nanos() > 0 {
                    secs.checked_add(1)
                        .ok_or_else(|| WatermarkError::OutOfRange(instant.to_rfc3339()))
                } else {
                    Ok(secs)
                }
            }
            Watermark::Local(local) => {
                let epoch = DateTime::<Utc>::from_timestamp(0, 0)
                    .ok_or_else(|| WatermarkError::OutOfRange("epoch".to_string()))?;
                let epoch_local = reference.from_utc_datetime(&epoch.naive_utc()).naive_local();
                let span = local.signed_duration_since(epoch_local);
                ceil_seconds(span).ok_or_else(|| WatermarkError::OutOfRange(local.to_string()))
            }
        }
    }
}

fn ceil_seconds(span: TimeDelta) -> Option<i64> {
    let secs = span.num_seconds();
    let rem = span.checked_sub(&TimeDelta::seconds(secs))?;
    if rem > TimeDelta::zero() {
        secs.checked_add(1)
    } else {
        Some(secs)
    }
}

/// Parses an IANA zone name used as the local reference for watermarks.
pub fn parse_reference_zone(name: &str) -> Result<Tz, WatermarkError> {
    name.parse::<Tz>()
        .map_err(|_| WatermarkError::UnknownTimezone(name.to_string()))
}

impl FromStr for Watermark {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WatermarkError::Parse(s.to_string()));
        }

        if let Ok(secs) = s.parse::<i64>() {
            return Ok(Watermark::EpochSeconds(secs));
        }

        if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
            return Ok(Watermark::Instant(instant));
        }

        for fmt in LOCAL_FORMATS {
            if let Ok(local) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Watermark::Local(local));
            }
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Watermark::Local)
            .ok_or_else(|| WatermarkError::Parse(s.to_string()))
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Watermark::Local(local) => write!(f, "{}", local.format("%Y-%m-%dT%H:%M:%S%.f")),
            Watermark::Instant(instant) => write!(f, "{}", instant.to_rfc3339()),
            Watermark::EpochSeconds(secs) => write!(f, "{secs}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(s: &str) -> Watermark {
        Watermark::Local(NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").unwrap())
    }

    #[test]
    fn local_epoch_is_zero_in_any_zone() {
        let w = local("1970-01-01T00:00:00");
        assert_eq!(w.to_epoch_seconds(Tz::UTC).unwrap(), 0);

        // New York was five hours behind UTC at the epoch, so the local epoch
        // sits five hours before midnight and local midnight is +18000s.
        assert_eq!(
            w.to_epoch_seconds(Tz::America__New_York).unwrap(),
            5 * 3600
        );
    }

    #[test]
    fn local_conversion_is_monotonic() {
        let earlier = local("2017-03-01T10:00:00").to_epoch_seconds(Tz::UTC).unwrap();
        let later = local("2017-03-01T10:00:01").to_epoch_seconds(Tz::UTC).unwrap();
        assert_eq!(later - earlier, 1);
        assert_eq!(earlier, 1_488_362_400);
    }

    #[test]
    fn fractional_seconds_round_up() {
        let w = local("1970-01-01T00:01:40.250");
        assert_eq!(w.to_epoch_seconds(Tz::UTC).unwrap(), 101);

        let instant: Watermark = "1970-01-01T00:01:40.5Z".parse().unwrap();
        assert_eq!(instant.to_epoch_seconds(Tz::UTC).unwrap(), 101);
    }

    #[test]
    fn negative_fractions_truncate_toward_the_later_second() {
        let w = local("1969-12-31T23:59:59.5");
        assert_eq!(w.to_epoch_seconds(Tz::UTC).unwrap(), 0);
    }

    #[test]
    fn instant_ignores_reference_zone() {
        let w: Watermark = "2017-03-01T10:00:00+02:00".parse().unwrap();
        assert_eq!(w.to_epoch_seconds(Tz::UTC).unwrap(), 1_488_355_200);
        assert_eq!(
            w.to_epoch_seconds(Tz::Asia__Tokyo).unwrap(),
            1_488_355_200
        );
    }

    #[test]
    fn parses_supported_forms() {
        assert_eq!("100".parse::<Watermark>().unwrap(), Watermark::EpochSeconds(100));
        assert!(matches!(
            "2017-03-01".parse::<Watermark>().unwrap(),
            Watermark::Local(_)
        ));
        assert!(matches!(
            "03/01/2017 10:00:00".parse::<Watermark>().unwrap(),
            Watermark::Local(_)
        ));
        assert!(matches!(
            "2017-03-01 10:00:00".parse::<Watermark>().unwrap(),
            Watermark::Local(_)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            "yesterday".parse::<Watermark>(),
            Err(WatermarkError::Parse("yesterday".to_string()))
        );
        assert!("".parse::<Watermark>().is_err());
    }

    #[test]
    fn unknown_zone_is_reported() {
        assert_eq!(
            parse_reference_zone("Mars/Olympus"),
            Err(WatermarkError::UnknownTimezone("Mars/Olympus".to_string()))
        );
        assert_eq!(parse_reference_zone("Europe/Berlin").unwrap(), Tz::Europe__Berlin);
    }
}

//! Layer 0: Time primitives
//!
//! Timestamp: UTC milliseconds since the Unix epoch.
//! VTEC renders minute precision as `yymmddTHHMMZ`; the all-zero form
//! `000000T0000Z` means "already in effect" on the start side and
//! "until further notice" on the end side.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::error::InvalidTime;

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Rendered in place of a start that has already passed, or an end that is UFN.
pub const VTEC_ZERO_TIME: &str = "000000T0000Z";

/// Two-digit VTEC years are read in this century.
pub const VTEC_CENTURY: i32 = 2000;

/// UTC instant with millisecond resolution.
///
/// `Timestamp::MAX` doubles as the end of an until-further-notice event.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Builds a timestamp from UTC calendar fields.
    pub fn from_utc(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
    ) -> Result<Self, InvalidTime> {
        let raw = || format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}Z");
        let month = Month::try_from(month).map_err(|e| InvalidTime {
            raw: raw(),
            reason: e.to_string(),
        })?;
        let date = Date::from_calendar_date(year, month, day).map_err(|e| InvalidTime {
            raw: raw(),
            reason: e.to_string(),
        })?;
        let time = Time::from_hms(hour, minute, 0).map_err(|e| InvalidTime {
            raw: raw(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_datetime(PrimitiveDateTime::new(date, time).assume_utc()))
    }

    /// Parses an RFC 3339 instant (`2010-01-01T05:10:00Z`).
    pub fn parse_rfc3339(raw: &str) -> Result<Self, InvalidTime> {
        OffsetDateTime::parse(raw.trim(), &Rfc3339)
            .map(Self::from_datetime)
            .map_err(|e| InvalidTime {
                raw: raw.to_string(),
                reason: e.to_string(),
            })
    }

    fn from_datetime(dt: OffsetDateTime) -> Self {
        let nanos = dt.unix_timestamp_nanos();
        Self((nanos / 1_000_000) as i64)
    }

    fn datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.0.div_euclid(SECOND_MS)).ok()
    }

    /// Calendar year (UTC). `None` only for sentinel values outside the calendar.
    pub fn year(self) -> Option<i32> {
        self.datetime().map(|dt| dt.year())
    }

    pub fn is_ufn(self) -> bool {
        self == Self::MAX
    }

    pub fn saturating_add_ms(self, delta_ms: i64) -> Self {
        Self(self.0.saturating_add(delta_ms))
    }

    pub fn saturating_sub_ms(self, delta_ms: i64) -> Self {
        Self(self.0.saturating_sub(delta_ms))
    }

    /// Absolute distance in milliseconds, saturating at `i64::MAX`.
    pub fn distance_ms(self, other: Timestamp) -> i64 {
        self.0.abs_diff(other.0).min(i64::MAX as u64) as i64
    }

    /// Truncates to the minute; VTEC carries nothing finer.
    pub fn floor_minute(self) -> Self {
        if self.is_ufn() {
            return self;
        }
        Self(self.0 - self.0.rem_euclid(MINUTE_MS))
    }

    /// Truncates to the top of the hour.
    pub fn floor_hour(self) -> Self {
        Self(self.0 - self.0.rem_euclid(HOUR_MS))
    }

    /// Whether `to_vtec` can carry this instant without losing the century.
    pub fn is_vtec_encodable(self) -> bool {
        self.is_ufn()
            || self
                .year()
                .is_some_and(|y| (VTEC_CENTURY..VTEC_CENTURY + 100).contains(&y))
    }

    /// `yymmddTHHMMZ`, seconds truncated.
    pub fn to_vtec(self) -> String {
        match self.datetime() {
            Some(dt) if !self.is_ufn() => format!(
                "{:02}{:02}{:02}T{:02}{:02}Z",
                dt.year().rem_euclid(100),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute()
            ),
            _ => VTEC_ZERO_TIME.to_string(),
        }
    }

    /// Parses `yymmddTHHMMZ`. The all-zero form yields `None`.
    pub fn parse_vtec(raw: &str) -> Result<Option<Self>, InvalidTime> {
        let invalid = |reason: &str| InvalidTime {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };
        if raw == VTEC_ZERO_TIME {
            return Ok(None);
        }
        let bytes = raw.as_bytes();
        if bytes.len() != 12 || bytes[6] != b'T' || bytes[11] != b'Z' {
            return Err(invalid("expected yymmddTHHMMZ"));
        }
        let digits = |range: std::ops::Range<usize>| -> Result<u8, InvalidTime> {
            raw.get(range)
                .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|s| s.parse::<u8>().ok())
                .ok_or_else(|| invalid("non-numeric field"))
        };
        let year = VTEC_CENTURY + i32::from(digits(0..2)?);
        let month = digits(2..4)?;
        let day = digits(4..6)?;
        let hour = digits(7..9)?;
        let minute = digits(9..11)?;
        Self::from_utc(year, month, day, hour, minute)
            .map(Some)
            .map_err(|e| invalid(&e.reason))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ufn() {
            return f.write_str("UFN");
        }
        match self.datetime() {
            Some(dt) => write!(
                f,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
                dt.year(),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            ),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> i64 {
        ts.0
    }
}

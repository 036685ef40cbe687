use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::ValidationError;

/// Canonical kick-off time: UTC, minute resolution, rendered `YYYY-MM-DD HH:MM`.
///
/// This is the one textual representation events carry across the platform;
/// it is stable across runs so normalized events round-trip byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KickoffTime(OffsetDateTime);

impl KickoffTime {
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|_| ValidationError::TimestampOutOfRange { value: seconds })?;
        Ok(Self(truncate_to_minute(parsed)))
    }

    pub fn from_unix_millis(millis: i64) -> Result<Self, ValidationError> {
        Self::from_unix_seconds(millis.div_euclid(1000))
    }

    pub fn parse_rfc3339(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::UnparseableStartTime {
                value: input.to_owned(),
            }
        })?;
        Ok(Self(truncate_to_minute(parsed.to_offset(UtcOffset::UTC))))
    }

    /// Parse the canonical `YYYY-MM-DD HH:MM` form, assumed UTC.
    pub fn parse_canonical(input: &str) -> Result<Self, ValidationError> {
        parse_canonical_inner(input).ok_or_else(|| ValidationError::UnparseableStartTime {
            value: input.to_owned(),
        })
    }

    pub fn format_canonical(self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
            self.0.hour(),
            self.0.minute()
        )
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }
}

fn parse_canonical_inner(input: &str) -> Option<KickoffTime> {
    let (date_part, time_part) = input.trim().split_once(' ')?;

    let mut date_fields = date_part.splitn(3, '-');
    let year: i32 = date_fields.next()?.parse().ok()?;
    let month: u8 = date_fields.next()?.parse().ok()?;
    let day: u8 = date_fields.next()?.parse().ok()?;

    let (hour, minute) = time_part.split_once(':')?;
    let hour: u8 = hour.parse().ok()?;
    let minute: u8 = minute.parse().ok()?;

    let date = Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?;
    let time = Time::from_hms(hour, minute, 0).ok()?;
    Some(KickoffTime(PrimitiveDateTime::new(date, time).assume_utc()))
}

fn truncate_to_minute(value: OffsetDateTime) -> OffsetDateTime {
    value
        .replace_second(0)
        .expect("zero is a valid second")
        .replace_nanosecond(0)
        .expect("zero is a valid nanosecond")
}

impl Display for KickoffTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_canonical())
    }
}

impl Serialize for KickoffTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_canonical())
    }
}

impl<'de> Deserialize<'de> for KickoffTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse_canonical(&value).map_err(D::Error::custom)
    }
}

/// RFC3339 UTC provenance timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchedAt(OffsetDateTime);

impl FetchedAt {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::UnparseableTimestamp {
                value: input.to_owned(),
            }
        })?;
        Ok(Self(parsed.to_offset(UtcOffset::UTC)))
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("UTC timestamp must be RFC3339 formattable")
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }
}

impl Display for FetchedAt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for FetchedAt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for FetchedAt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

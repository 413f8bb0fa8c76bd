use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

use crate::LoggerError;

/// Timezone used for log timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggerTimeZone {
    #[default]
    Utc,
    Local,
}

impl LoggerTimeZone {
    /// Resolve to a fixed offset.
    ///
    /// The local offset can only be read safely while the process is single-threaded,
    /// so this is called once from [`crate::init_logger`]. Falls back to UTC when the
    /// offset is unavailable.
    pub fn offset(self) -> UtcOffset {
        match self {
            LoggerTimeZone::Utc => UtcOffset::UTC,
            LoggerTimeZone::Local => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        })
    }
}

impl Serialize for LoggerTimeZone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LoggerTimeZone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// RFC3339 timestamps at a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct Rfc3339Timer {
    offset: UtcOffset,
}

impl Rfc3339Timer {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(UtcOffset::UTC)
    }

    fn stamp(&self, at: OffsetDateTime) -> String {
        at.to_offset(self.offset)
            .format(&Rfc3339)
            .unwrap_or_else(|_| at.unix_timestamp().to_string())
    }
}

impl FormatTime for Rfc3339Timer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        w.write_str(&self.stamp(OffsetDateTime::now_utc()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn utc_stamp_ends_with_z() {
        let t = Rfc3339Timer::utc();
        assert_eq!(t.stamp(datetime!(2024-03-01 12:30:00 UTC)), "2024-03-01T12:30:00Z");
    }

    #[test]
    fn fixed_offset_is_applied() {
        let t = Rfc3339Timer::new(offset!(+2));
        assert_eq!(
            t.stamp(datetime!(2024-03-01 12:30:00 UTC)),
            "2024-03-01T14:30:00+02:00"
        );
    }

    #[test]
    fn timezone_parsing() {
        assert_eq!("UTC".parse::<LoggerTimeZone>().unwrap(), LoggerTimeZone::Utc);
        assert_eq!("local".parse::<LoggerTimeZone>().unwrap(), LoggerTimeZone::Local);
        assert!(matches!(
            "Europe/Paris".parse::<LoggerTimeZone>(),
            Err(LoggerError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn utc_offset_is_zero() {
        assert_eq!(LoggerTimeZone::Utc.offset(), UtcOffset::UTC);
    }
}

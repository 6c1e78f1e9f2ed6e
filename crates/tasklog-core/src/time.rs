//! Time types for remote calendar events.
//!
//! Calendar APIs report event boundaries either as a full date-time with an
//! offset or as a bare date for all-day events. [`RawEventTime`] keeps the
//! wire shape untouched and [`EventTime`] is the parsed, comparable form.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An event boundary exactly as the calendar API returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventTime {
    /// Date-only value (`YYYY-MM-DD`) used by all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// RFC 3339 date-time with offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// IANA zone the event was created in, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl RawEventTime {
    /// Creates a boundary carrying a date-time.
    pub fn date_time(value: impl Into<String>) -> Self {
        Self {
            date_time: Some(value.into()),
            ..Self::default()
        }
    }

    /// Creates a date-only boundary.
    pub fn date(value: impl Into<String>) -> Self {
        Self {
            date: Some(value.into()),
            ..Self::default()
        }
    }

    /// Returns true if this boundary carries a time-of-day component.
    pub fn has_time_of_day(&self) -> bool {
        self.date_time.as_deref().is_some_and(|dt| dt.contains('T'))
    }

    /// Parses the boundary into an [`EventTime`].
    pub fn parse(&self) -> Result<EventTime, TimeParseError> {
        if let Some(ref dt) = self.date_time {
            let parsed = DateTime::parse_from_rfc3339(dt).map_err(|e| TimeParseError {
                value: dt.clone(),
                reason: e.to_string(),
            })?;
            return Ok(EventTime::DateTime(parsed.with_timezone(&Utc)));
        }

        if let Some(ref d) = self.date {
            let parsed = NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| TimeParseError {
                value: d.clone(),
                reason: e.to_string(),
            })?;
            return Ok(EventTime::AllDay(parsed));
        }

        Err(TimeParseError {
            value: String::new(),
            reason: "neither date nor dateTime is set".to_string(),
        })
    }
}

/// A boundary value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse event time {value:?}: {reason}")]
pub struct TimeParseError {
    /// The offending raw value.
    pub value: String,
    /// Why parsing failed.
    pub reason: String,
}

/// A parsed event boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// An instant, normalized to UTC.
    DateTime(DateTime<Utc>),
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Signed span from `self` to `end`.
    ///
    /// Only meaningful when both sides are `DateTime`; returns `None` otherwise.
    pub fn span_to(&self, end: &EventTime) -> Option<TimeDelta> {
        match (self, end) {
            (Self::DateTime(s), Self::DateTime(e)) => Some(*e - *s),
            _ => None,
        }
    }
}

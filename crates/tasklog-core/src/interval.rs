//! Pairing of packed timestamp sequences into time intervals.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{CoreError, CoreResult};

/// A logged work interval, both ends in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    /// When the interval started.
    pub start_time: DateTime<Utc>,
    /// When the interval ended.
    pub end_time: DateTime<Utc>,
}

impl TimeInterval {
    /// Creates an interval from two UTC epoch millisecond values.
    pub fn from_millis(start: i64, end: i64) -> CoreResult<Self> {
        Ok(Self {
            start_time: utc_from_millis(start)?,
            end_time: utc_from_millis(end)?,
        })
    }

    /// Signed length of the interval.
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }
}

/// Intervals recovered from one packed sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTimes {
    /// Intervals in input pair order.
    pub intervals: Vec<TimeInterval>,
    /// Number of trailing elements without a partner (0 or 1).
    pub dropped: usize,
}

/// Pairs `times[2i]` with `times[2i + 1]`.
///
/// An unpaired trailing element is dropped and reported in
/// [`ParsedTimes::dropped`] rather than treated as an error.
pub fn parse_times(times: &[i64]) -> CoreResult<ParsedTimes> {
    let pairs = times.chunks_exact(2);
    let dropped = pairs.remainder().len();

    let intervals = pairs
        .map(|pair| TimeInterval::from_millis(pair[0], pair[1]))
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(ParsedTimes { intervals, dropped })
}

fn utc_from_millis(millis: i64) -> CoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or(CoreError::InvalidTimestamp { millis })
}

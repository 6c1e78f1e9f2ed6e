//! Detection of instant (non-positive duration) calendar events.
//!
//! An event is eligible for cleanup when both boundaries carry a
//! time-of-day and the end is not after the start. All-day events are never
//! eligible, whatever their dates say.

use chrono::TimeDelta;
use tracing::{debug, info, warn};

use crate::event::RemoteEvent;

/// Verdict for a single remote event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Timed event whose span is zero or negative.
    Eligible { span: TimeDelta },
    /// Timed event with a strictly positive span.
    Positive { span: TimeDelta },
    /// At least one boundary has no time-of-day.
    AllDay,
    /// A timed boundary that does not parse.
    Invalid,
}

impl Classification {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }
}

/// Classifies a remote event.
pub fn classify(event: &RemoteEvent) -> Classification {
    if !event.start.has_time_of_day() || !event.end.has_time_of_day() {
        return Classification::AllDay;
    }

    let (Ok(start), Ok(end)) = (event.start.parse(), event.end.parse()) else {
        return Classification::Invalid;
    };

    match start.span_to(&end) {
        Some(span) if span <= TimeDelta::zero() => Classification::Eligible { span },
        Some(span) => Classification::Positive { span },
        None => Classification::Invalid,
    }
}

/// Partition of a listing by classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Instant events, in listing order.
    pub eligible: Vec<RemoteEvent>,
    pub skipped_all_day: usize,
    pub skipped_invalid: usize,
    /// Events with a positive span, left untouched.
    pub kept: usize,
}

/// Keeps the instant events of `events`, preserving order.
///
/// Each all-day skip is logged at info, each unparseable boundary at warn.
pub fn filter_instant_events(events: Vec<RemoteEvent>) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for event in events {
        match classify(&event) {
            Classification::Eligible { span } => {
                debug!(
                    id = event.id.as_deref().unwrap_or("-"),
                    title = event.display_title(),
                    span_ms = span.num_milliseconds(),
                    "instant event"
                );
                outcome.eligible.push(event);
            }
            Classification::Positive { .. } => outcome.kept += 1,
            Classification::AllDay => {
                info!(title = event.display_title(), "Skipping all-day event");
                outcome.skipped_all_day += 1;
            }
            Classification::Invalid => {
                warn!(
                    id = event.id.as_deref().unwrap_or("-"),
                    start = ?event.start.date_time,
                    end = ?event.end.date_time,
                    "Skipping event with unparseable time"
                );
                outcome.skipped_invalid += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::RawEventTime;

    fn timed(id: &str, start: &str, end: &str) -> RemoteEvent {
        RemoteEvent::new(id, RawEventTime::date_time(start), RawEventTime::date_time(end))
    }

    fn all_day(id: &str, start: &str, end: &str) -> RemoteEvent {
        RemoteEvent::new(id, RawEventTime::date(start), RawEventTime::date(end))
    }

    #[test]
    fn mixed_listing_keeps_zero_and_negative() {
        let events = vec![
            all_day("holiday", "2024-03-15", "2024-03-16"),
            timed("meeting", "2024-03-15T10:00:00Z", "2024-03-15T10:30:00Z"),
            timed("zero", "2024-03-15T11:00:00Z", "2024-03-15T11:00:00Z"),
            timed("negative", "2024-03-15T12:00:00Z", "2024-03-15T11:55:00Z"),
        ];

        let outcome = filter_instant_events(events);
        let ids: Vec<_> = outcome
            .eligible
            .iter()
            .map(|e| e.id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["zero", "negative"]);
        assert_eq!(outcome.skipped_all_day, 1);
        assert_eq!(outcome.kept, 1);
        assert_eq!(outcome.skipped_invalid, 0);
    }

    #[test]
    fn one_millisecond_is_positive() {
        let event = timed("tiny", "2024-03-15T10:00:00.000Z", "2024-03-15T10:00:00.001Z");
        assert_eq!(
            classify(&event),
            Classification::Positive {
                span: TimeDelta::milliseconds(1)
            }
        );
    }

    #[test]
    fn offsets_are_compared_as_instants() {
        // same instant written in two zones
        let event = timed("tz", "2024-03-15T10:00:00+02:00", "2024-03-15T08:00:00Z");
        assert!(classify(&event).is_eligible());
    }

    #[test]
    fn mixed_all_day_and_timed_is_all_day() {
        let event = RemoteEvent::new(
            "mixed",
            RawEventTime::date("2024-03-15"),
            RawEventTime::date_time("2024-03-15T00:00:00Z"),
        );
        assert_eq!(classify(&event), Classification::AllDay);
    }

    #[test]
    fn missing_boundaries_are_all_day() {
        assert_eq!(classify(&RemoteEvent::default()), Classification::AllDay);
    }

    #[test]
    fn unparseable_time_is_invalid() {
        let event = timed("bad", "2024-03-15Tnoon", "2024-03-15T10:00:00Z");
        assert_eq!(classify(&event), Classification::Invalid);

        let outcome = filter_instant_events(vec![event]);
        assert!(outcome.eligible.is_empty());
        assert_eq!(outcome.skipped_invalid, 1);
    }

    #[test]
    fn order_is_preserved() {
        let events = vec![
            timed("b", "2024-03-15T12:00:00Z", "2024-03-15T12:00:00Z"),
            timed("a", "2024-03-15T09:00:00Z", "2024-03-15T09:00:00Z"),
        ];
        let outcome = filter_instant_events(events);
        assert_eq!(outcome.eligible[0].id.as_deref(), Some("b"));
        assert_eq!(outcome.eligible[1].id.as_deref(), Some("a"));
    }

    #[test]
    fn events_without_id_are_still_classified() {
        let event = timed("x", "2024-03-15T12:00:00Z", "2024-03-15T12:00:00Z").without_id();
        let outcome = filter_instant_events(vec![event]);
        assert_eq!(outcome.eligible.len(), 1);
    }
}

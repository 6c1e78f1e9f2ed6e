//! iCalendar serialization of calendar entries.
//!
//! Entries are first lowered to an [`EventDescription`] whose boundaries are
//! civil `(year, month, day, hour, minute)` arrays. Seconds and sub-second
//! precision are discarded at that step. The whole batch is then handed to
//! the `icalendar` writer at once; a bad entry anywhere fails the batch.
//!
//! Output is deterministic: UIDs are derived from the entry content and
//! position, and `DTSTAMP` is pinned to the entry start, so exporting the
//! same data twice produces identical bytes.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::entry::CalendarEntry;
use crate::error::{CoreError, CoreResult};

/// Domain suffix appended to generated UIDs.
const UID_DOMAIN: &str = "tasklog";

/// Highest year an iCalendar `DATE-TIME` can carry (four digits).
const MAX_ICS_YEAR: i32 = 9999;

/// A wall-clock minute without offset: `(year, month, day, hour, minute)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl CivilDateTime {
    /// Creates a civil date-time from its components without validating them.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
    }

    /// Renders `instant` in UTC and reads the five components back.
    ///
    /// Seconds and milliseconds are truncated.
    pub fn from_utc(instant: &DateTime<Utc>) -> CoreResult<Self> {
        let rendered = instant.format("%Y-%-m-%-d-%-H-%-M").to_string();
        let unrepresentable = || CoreError::UnrepresentableInstant {
            instant: instant.to_rfc3339(),
        };

        let parts = rendered
            .split('-')
            .map(|part| part.parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| unrepresentable())?;

        match parts.as_slice() {
            &[year, month, day, hour, minute] => Ok(Self {
                year: i32::try_from(year).map_err(|_| unrepresentable())?,
                month: u32::try_from(month).map_err(|_| unrepresentable())?,
                day: u32::try_from(day).map_err(|_| unrepresentable())?,
                hour: u32::try_from(hour).map_err(|_| unrepresentable())?,
                minute: u32::try_from(minute).map_err(|_| unrepresentable())?,
            }),
            _ => Err(unrepresentable()),
        }
    }

    /// Returns the components as a tuple in array order.
    pub fn components(&self) -> (i32, u32, u32, u32, u32) {
        (self.year, self.month, self.day, self.hour, self.minute)
    }

    /// Validates the components and builds the naive wall-clock value.
    pub fn to_naive(&self) -> CoreResult<NaiveDateTime> {
        let invalid = || CoreError::InvalidCivilDateTime {
            year: self.year,
            month: self.month,
            day: self.day,
            hour: self.hour,
            minute: self.minute,
        };

        if !(0..=MAX_ICS_YEAR).contains(&self.year) {
            return Err(invalid());
        }

        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_opt(self.hour, self.minute, 0))
            .ok_or_else(invalid)
    }
}

/// How the serializer must interpret a civil date-time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputType {
    /// The components are UTC; written with a `Z` suffix.
    #[default]
    Utc,
    /// The components are floating local time; written without offset.
    Local,
}

/// Event shape handed to the calendar writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescription {
    pub title: String,
    pub description: String,
    pub start: CivilDateTime,
    pub start_input_type: InputType,
    pub end: CivilDateTime,
    pub end_input_type: InputType,
}

impl EventDescription {
    /// Lowers a calendar entry, declaring both boundaries as UTC.
    pub fn from_entry(entry: &CalendarEntry) -> CoreResult<Self> {
        Ok(Self {
            title: entry.title.clone(),
            description: entry.description(),
            start: CivilDateTime::from_utc(&entry.start_time)?,
            start_input_type: InputType::Utc,
            end: CivilDateTime::from_utc(&entry.end_time)?,
            end_input_type: InputType::Utc,
        })
    }
}

/// Serializes a batch of entries into one calendar document.
pub fn serialize_entries(entries: &[CalendarEntry]) -> CoreResult<String> {
    let descriptions = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            EventDescription::from_entry(entry)
                .map_err(|e| CoreError::serialization(index, &entry.title, e.to_string()))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    create_events(&descriptions)
}

/// Builds the calendar text for a batch of event descriptions.
///
/// Every description is validated before any output is produced.
pub fn create_events(descriptions: &[EventDescription]) -> CoreResult<String> {
    let mut calendar = Calendar::new();

    for (index, desc) in descriptions.iter().enumerate() {
        let event = build_event(index, desc)
            .map_err(|e| CoreError::serialization(index, &desc.title, e.to_string()))?;
        calendar.push(event);
    }

    let text = calendar.to_string();
    debug!(events = descriptions.len(), bytes = text.len(), "serialized calendar");
    Ok(text)
}

fn build_event(index: usize, desc: &EventDescription) -> CoreResult<Event> {
    let start = desc.start.to_naive()?;
    let end = desc.end.to_naive()?;

    let mut event = Event::new();
    event
        .uid(&event_uid(index, desc))
        .timestamp(start.and_utc())
        .summary(&desc.title)
        .starts(to_calendar_date_time(start, desc.start_input_type))
        .ends(to_calendar_date_time(end, desc.end_input_type));

    if !desc.description.is_empty() {
        event.description(&desc.description);
    }

    Ok(event.done())
}

fn to_calendar_date_time(naive: NaiveDateTime, input_type: InputType) -> CalendarDateTime {
    match input_type {
        InputType::Utc => CalendarDateTime::Utc(naive.and_utc()),
        InputType::Local => CalendarDateTime::Floating(naive),
    }
}

/// Content-derived UID, stable across runs for unchanged input.
fn event_uid(index: usize, desc: &EventDescription) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    hasher.update(desc.title.as_bytes());
    hasher.update([0x1f]);
    hasher.update(format!("{:?}", desc.start.components()).as_bytes());
    hasher.update(format!("{:?}", desc.end.components()).as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}@{}", &digest[..32], UID_DOMAIN)
}

/// An event read back from calendar text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub uid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parses calendar text and returns its events in document order.
///
/// Events lacking a start are skipped; a missing end defaults to the start.
pub fn parse_calendar(ics: &str) -> CoreResult<Vec<ParsedEvent>> {
    let calendar = ics.parse::<Calendar>().map_err(CoreError::Parse)?;

    Ok(calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => {
                let start = to_utc(event.get_start()?);
                let end = event.get_end().map(to_utc).unwrap_or(start);
                Some(ParsedEvent {
                    uid: event.get_uid().map(str::to_string),
                    title: event.get_summary().map(str::to_string),
                    description: event.get_description().map(str::to_string),
                    start,
                    end,
                })
            }
            _ => None,
        })
        .collect())
}

fn to_utc(dt: DatePerhapsTime) -> DateTime<Utc> {
    match dt {
        DatePerhapsTime::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => dt,
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => naive.and_utc(),
        // Zone resolution is out of scope; treat the wall clock as UTC.
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, .. }) => {
            date_time.and_utc()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::TimeInterval;
    use chrono::{TimeDelta, TimeZone};

    fn entry(title: &str, start_ms: i64, end_ms: i64) -> CalendarEntry {
        CalendarEntry::new(title, TimeInterval::from_millis(start_ms, end_ms).unwrap())
    }

    mod civil {
        use super::*;

        #[test]
        fn components_from_utc() {
            // 2023-11-14T22:13:20.000Z
            let dt = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
            let civil = CivilDateTime::from_utc(&dt).unwrap();
            assert_eq!(civil.components(), (2023, 11, 14, 22, 13));
        }

        #[test]
        fn seconds_are_truncated() {
            let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 59).unwrap()
                + TimeDelta::milliseconds(999);
            let civil = CivilDateTime::from_utc(&dt).unwrap();
            assert_eq!(civil.components(), (2024, 1, 2, 3, 4));
            assert_eq!(
                civil.to_naive().unwrap().and_utc(),
                Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap()
            );
        }

        #[test]
        fn rejects_impossible_dates() {
            assert!(CivilDateTime::new(2023, 2, 30, 0, 0).to_naive().is_err());
            assert!(CivilDateTime::new(2023, 13, 1, 0, 0).to_naive().is_err());
            assert!(CivilDateTime::new(2023, 1, 1, 24, 0).to_naive().is_err());
            assert!(CivilDateTime::new(2023, 1, 1, 0, 60).to_naive().is_err());
        }

        #[test]
        fn rejects_years_outside_four_digits() {
            assert!(CivilDateTime::new(10_000, 1, 1, 0, 0).to_naive().is_err());
            assert!(CivilDateTime::new(-1, 1, 1, 0, 0).to_naive().is_err());
        }

        #[test]
        fn negative_years_cannot_be_rendered() {
            let dt = Utc.with_ymd_and_hms(-44, 3, 15, 12, 0, 0).unwrap();
            assert!(matches!(
                CivilDateTime::from_utc(&dt),
                Err(CoreError::UnrepresentableInstant { .. })
            ));
        }
    }

    mod serialize {
        use super::*;

        #[test]
        fn focus_block_end_to_end() {
            let entries = vec![entry("Focus block", 1_700_000_000_000, 1_700_003_600_000)];
            let ics = serialize_entries(&entries).unwrap();

            assert!(ics.starts_with("BEGIN:VCALENDAR"));
            assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
            assert!(ics.contains("SUMMARY:Focus block"));
            assert!(ics.contains("DTSTART:20231114T221300Z"));
            assert!(ics.contains("DTEND:20231114T231300Z"));

            let parsed = parse_calendar(&ics).unwrap();
            assert_eq!(parsed.len(), 1);
            assert_eq!(parsed[0].end - parsed[0].start, TimeDelta::minutes(60));
        }

        #[test]
        fn round_trip_keeps_titles_and_minutes() {
            let entries = vec![
                entry("Alpha", 1_700_000_012_345, 1_700_000_912_345),
                entry("Beta", 1_700_010_000_000, 1_700_010_059_999),
                entry("Gamma", 1_700_020_000_000, 1_700_027_200_000),
            ];

            let ics = serialize_entries(&entries).unwrap();
            let parsed = parse_calendar(&ics).unwrap();
            assert_eq!(parsed.len(), entries.len());

            for (original, back) in entries.iter().zip(&parsed) {
                assert_eq!(back.title.as_deref(), Some(original.title.as_str()));
                let start = CivilDateTime::from_utc(&original.start_time).unwrap();
                let end = CivilDateTime::from_utc(&original.end_time).unwrap();
                assert_eq!(CivilDateTime::from_utc(&back.start).unwrap(), start);
                assert_eq!(CivilDateTime::from_utc(&back.end).unwrap(), end);
                // truncated to the minute, never rounded up
                assert!(back.start <= original.start_time);
                assert_eq!(back.start.timestamp() % 60, 0);
            }
        }

        #[test]
        fn output_is_deterministic() {
            let entries = vec![
                entry("Same", 1_000_000, 4_600_000),
                entry("Same", 1_000_000, 4_600_000),
            ];

            let first = serialize_entries(&entries).unwrap();
            let second = serialize_entries(&entries).unwrap();
            assert_eq!(first, second);

            let uids: Vec<_> = parse_calendar(&first)
                .unwrap()
                .into_iter()
                .map(|e| e.uid.unwrap())
                .collect();
            assert_eq!(uids.len(), 2);
            assert_ne!(uids[0], uids[1], "identical intervals still get distinct UIDs");
        }

        #[test]
        fn empty_batch_is_a_valid_calendar() {
            let ics = serialize_entries(&[]).unwrap();
            assert!(ics.contains("BEGIN:VCALENDAR"));
            assert!(parse_calendar(&ics).unwrap().is_empty());
        }

        #[test]
        fn tags_become_description() {
            let tagged = entry("Tagged", 0, 60_000).with_tag("deep");
            let ics = serialize_entries(&[tagged]).unwrap();
            let parsed = parse_calendar(&ics).unwrap();
            assert_eq!(parsed[0].description.as_deref(), Some("#deep"));
        }

        #[test]
        fn untagged_entries_have_no_description() {
            let ics = serialize_entries(&[entry("Plain", 0, 60_000)]).unwrap();
            assert!(!ics.contains("DESCRIPTION"));
        }

        #[test]
        fn one_bad_description_fails_the_batch() {
            let good = EventDescription::from_entry(&entry("Good", 0, 60_000)).unwrap();
            let mut bad = good.clone();
            bad.title = "Bad".to_string();
            bad.end = CivilDateTime::new(2023, 2, 30, 9, 0);

            let err = create_events(&[good, bad]).unwrap_err();
            match err {
                CoreError::Serialization { index, title, .. } => {
                    assert_eq!(index, 1);
                    assert_eq!(title, "Bad");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn unrepresentable_entry_fails_the_batch() {
            let far_future = CalendarEntry {
                title: "Far".to_string(),
                tags: Default::default(),
                start_time: Utc.with_ymd_and_hms(12_000, 1, 1, 0, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(12_000, 1, 1, 1, 0, 0).unwrap(),
            };
            let err = serialize_entries(&[entry("Ok", 0, 60_000), far_future]).unwrap_err();
            assert!(matches!(err, CoreError::Serialization { index: 1, .. }));
        }

        #[test]
        fn local_input_type_is_floating() {
            let mut desc = EventDescription::from_entry(&entry("Local", 0, 60_000)).unwrap();
            desc.start_input_type = InputType::Local;
            desc.end_input_type = InputType::Local;
            let ics = create_events(&[desc]).unwrap();
            assert!(ics.contains("DTSTART:19700101T000000\r\n"));
        }
    }
}

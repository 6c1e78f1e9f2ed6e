//! Calendar entries synthesized from task records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::CoreResult;
use crate::interval::{TimeInterval, parse_times};
use crate::task::TaskRecord;

/// One calendar event derived from a single logged interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    /// Title of the parent task.
    pub title: String,
    /// Tags rendered into the description. Always present, currently empty.
    pub tags: BTreeSet<String>,
    /// Interval start.
    pub start_time: DateTime<Utc>,
    /// Interval end.
    pub end_time: DateTime<Utc>,
}

impl CalendarEntry {
    /// Creates an entry for `interval` under `title` with no tags.
    pub fn new(title: impl Into<String>, interval: TimeInterval) -> Self {
        Self {
            title: title.into(),
            tags: BTreeSet::new(),
            start_time: interval.start_time,
            end_time: interval.end_time,
        }
    }

    /// Builder method to attach a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Renders the tags as `#tag` words separated by single spaces.
    pub fn description(&self) -> String {
        self.tags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of flattening a batch of task records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    /// Entries in record order, then interval order.
    pub entries: Vec<CalendarEntry>,
    /// Records that carried no `times` field.
    pub untracked_records: usize,
    /// Trailing timestamps dropped from odd-length sequences.
    pub dropped_timestamps: usize,
}

/// Flat-maps task records into calendar entries.
///
/// Records without `times` yield nothing. An out-of-range timestamp in any
/// record fails the whole batch.
pub fn synthesize(records: &[TaskRecord]) -> CoreResult<Synthesis> {
    let mut synthesis = Synthesis::default();

    for record in records {
        let Some(ref times) = record.times else {
            synthesis.untracked_records += 1;
            continue;
        };

        let parsed = parse_times(times)?;
        if parsed.dropped > 0 {
            warn!(
                task = record.label(),
                len = times.len(),
                "odd number of timestamps, dropping the unpaired last one"
            );
            synthesis.dropped_timestamps += parsed.dropped;
        }

        synthesis.entries.extend(
            parsed
                .intervals
                .into_iter()
                .map(|interval| CalendarEntry::new(record.title.clone(), interval)),
        );
    }

    debug!(
        records = records.len(),
        entries = synthesis.entries.len(),
        untracked = synthesis.untracked_records,
        dropped = synthesis.dropped_timestamps,
        "synthesized calendar entries"
    );

    Ok(synthesis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn one_entry_per_interval_with_parent_title() {
        let records = vec![
            TaskRecord::new("Focus block").with_times(vec![1_700_000_000_000, 1_700_003_600_000]),
            TaskRecord::new("Email").with_times(vec![1_000, 2_000, 3_000, 4_000]),
        ];

        let synthesis = synthesize(&records).unwrap();
        let titles: Vec<&str> = synthesis.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Focus block", "Email", "Email"]);

        let focus = &synthesis.entries[0];
        assert_eq!(focus.end_time - focus.start_time, TimeDelta::minutes(60));
        assert!(focus.tags.is_empty());
    }

    #[test]
    fn records_without_times_contribute_nothing() {
        let records = vec![
            TaskRecord::new("Untracked"),
            TaskRecord::new("Tracked").with_times(vec![1_000, 2_000]),
            TaskRecord::new("Also untracked"),
        ];

        let synthesis = synthesize(&records).unwrap();
        assert_eq!(synthesis.entries.len(), 1);
        assert_eq!(synthesis.untracked_records, 2);
    }

    #[test]
    fn empty_times_is_tracked_but_empty() {
        let records = vec![TaskRecord::new("Empty").with_times(vec![])];
        let synthesis = synthesize(&records).unwrap();
        assert!(synthesis.entries.is_empty());
        assert_eq!(synthesis.untracked_records, 0);
    }

    #[test]
    fn dropped_timestamps_are_counted() {
        let records = vec![
            TaskRecord::new("A").with_times(vec![1_000, 2_000, 3_000]),
            TaskRecord::new("B").with_times(vec![5_000]),
        ];

        let synthesis = synthesize(&records).unwrap();
        assert_eq!(synthesis.entries.len(), 1);
        assert_eq!(synthesis.dropped_timestamps, 2);
    }

    #[test]
    fn description_joins_hash_tags() {
        let interval = TimeInterval::from_millis(0, 60_000).unwrap();
        let entry = CalendarEntry::new("Tagged", interval)
            .with_tag("deep")
            .with_tag("client");
        assert_eq!(entry.description(), "#client #deep");

        let bare = CalendarEntry::new("Bare", interval);
        assert_eq!(bare.description(), "");
    }
}

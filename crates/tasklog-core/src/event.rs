//! Remote calendar events as listed by the calendar API.

use serde::{Deserialize, Serialize};

use crate::time::RawEventTime;

/// An event as returned by the remote calendar.
///
/// Only the fields the cleanup pass looks at are kept; everything else in the
/// API payload is ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    /// Server-assigned identifier. Required for deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub start: RawEventTime,
    #[serde(default)]
    pub end: RawEventTime,
}

impl RemoteEvent {
    pub fn new(id: impl Into<String>, start: RawEventTime, end: RawEventTime) -> Self {
        Self {
            id: Some(id.into()),
            start,
            end,
            ..Self::default()
        }
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to clear the id.
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    /// Summary or a placeholder, for log lines.
    pub fn display_title(&self) -> &str {
        self.summary.as_deref().unwrap_or("(no title)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_api_item() {
        let json = r#"{
            "kind": "calendar#event",
            "id": "abc123",
            "status": "confirmed",
            "summary": "Standup",
            "start": {"dateTime": "2024-03-15T10:00:00+01:00", "timeZone": "Europe/Paris"},
            "end": {"dateTime": "2024-03-15T10:00:00+01:00"},
            "organizer": {"email": "me@example.com"}
        }"#;

        let event: RemoteEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id.as_deref(), Some("abc123"));
        assert_eq!(event.display_title(), "Standup");
        assert!(event.start.has_time_of_day());
        assert_eq!(event.start.time_zone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn missing_boundaries_default_to_empty() {
        let event: RemoteEvent = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(event.start, RawEventTime::default());
        assert_eq!(event.display_title(), "(no title)");
    }
}

//! Time-tracking task records as stored in the document database.

use serde::{Deserialize, Deserializer, Serialize};

/// Name of the logical collection task documents are tagged with.
pub const TASKS_COLLECTION: &str = "Tasks";

/// A task document with its packed list of logged intervals.
///
/// `times` holds UTC epoch milliseconds where element `2i` starts an
/// interval and element `2i + 1` ends it. Documents without `times` were
/// never tracked and contribute nothing to the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Document identifier, used only for diagnostics.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Task title, copied verbatim into every calendar entry.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Packed start/end timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<i64>>,
}

impl TaskRecord {
    /// Creates a record with the given title and no tracked time.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            times: None,
        }
    }

    /// Builder method to set the packed timestamps.
    pub fn with_times(mut self, times: Vec<i64>) -> Self {
        self.times = Some(times);
        self
    }

    /// Builder method to set the document id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Label used in log lines: the id when present, else the title.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.title)
    }
}

/// Untitled tasks are stored with `"title": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

//! Error types for the pure export and cleanup transforms.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while turning task records into a calendar file.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A millisecond timestamp lies outside the representable range.
    #[error("timestamp {millis} is out of range")]
    InvalidTimestamp { millis: i64 },

    /// A civil date-time array does not name a real calendar minute.
    #[error("invalid civil date-time {year}-{month}-{day} {hour}:{minute}")]
    InvalidCivilDateTime {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },

    /// An instant could not be rendered as a civil date-time array.
    #[error("cannot express {instant} as a civil date-time")]
    UnrepresentableInstant { instant: String },

    /// Calendar text could not be parsed back.
    #[error("failed to parse calendar: {0}")]
    Parse(String),

    /// The calendar serializer rejected an entry in the batch.
    #[error("failed to serialize entry #{index} ({title}): {message}")]
    Serialization {
        index: usize,
        title: String,
        message: String,
    },
}

impl CoreError {
    /// Creates a serialization error for the entry at `index`.
    pub fn serialization(index: usize, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            index,
            title: title.into(),
            message: message.into(),
        }
    }
}

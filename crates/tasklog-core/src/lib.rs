//! Core types: task intervals, calendar entries, ICS output, instant events

pub mod entry;
pub mod error;
pub mod event;
pub mod ics;
pub mod instant;
pub mod interval;
pub mod task;
pub mod time;
pub mod tracing;

pub use entry::{CalendarEntry, Synthesis, synthesize};
pub use error::{CoreError, CoreResult};
pub use event::RemoteEvent;
pub use ics::{
    CivilDateTime, EventDescription, InputType, ParsedEvent, create_events, parse_calendar,
    serialize_entries,
};
pub use instant::{Classification, FilterOutcome, classify, filter_instant_events};
pub use interval::{ParsedTimes, TimeInterval, parse_times};
pub use task::{TASKS_COLLECTION, TaskRecord};
pub use time::{EventTime, RawEventTime, TimeParseError};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

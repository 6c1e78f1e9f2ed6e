//! Network collaborators for tasklog.
//!
//! - [`TaskStore`] / [`CouchStore`]: reads task documents for the export
//! - [`CalendarApi`]: list and delete against a remote calendar
//! - [`CalendarPager`] and [`EventDeleter`]: the cleanup pipeline's I/O ends
//! - [`RunContext`]: overall deadline and cancellation for every remote call
//!
//! ```text
//!  CouchStore ──► Vec<TaskRecord>              (export)
//!
//!  CalendarPager ──► Vec<RemoteEvent> ──► filter ──► EventDeleter
//!         │                                              │
//!         └──────────────── CalendarApi ─────────────────┘
//!                       (GoogleCalendar)               (cleanup)
//! ```

pub mod calendar;
pub mod context;
pub mod deleter;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod pager;
pub mod store;

use std::future::Future;
use std::pin::Pin;

pub use calendar::{CalendarApi, EventPage, ListQuery};
pub use context::RunContext;
pub use deleter::{DeletionReport, EventDeleter, FailedDeletion};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use pager::CalendarPager;
pub use store::{CouchConfig, CouchStore, TaskStore};

/// A boxed future for the trait seams, usable through `dyn`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

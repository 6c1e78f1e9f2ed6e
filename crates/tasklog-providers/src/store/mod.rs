//! Task record sources.
//!
//! [`TaskStore`] is the seam between the export pipeline and the document
//! database. [`CouchStore`] is the CouchDB `_find` implementation.

mod config;
mod couch;

pub use config::CouchConfig;
pub use couch::CouchStore;

use tasklog_core::TaskRecord;

use crate::BoxFuture;
use crate::context::RunContext;
use crate::error::ProviderResult;

/// A read-only source of task records.
pub trait TaskStore: Send + Sync {
    /// Short name used in logs and error tags.
    fn name(&self) -> &str;

    /// Returns every document of the task collection.
    ///
    /// Order is whatever the store returns; it is preserved downstream.
    fn find_tasks<'a>(
        &'a self,
        ctx: &'a RunContext,
    ) -> BoxFuture<'a, ProviderResult<Vec<TaskRecord>>>;
}

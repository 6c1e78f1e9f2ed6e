//! `tasklog export`: task store → ICS file.
//!
//! The whole calendar is built in memory first. Nothing is written unless
//! every entry serialized, and the file is replaced atomically.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use tasklog_core::{serialize_entries, synthesize};
use tasklog_providers::{CouchStore, ProviderError, RunContext, TaskStore};

use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub records: usize,
    pub entries: usize,
    /// Records with no `times` field.
    pub untracked_records: usize,
    /// Unpaired trailing timestamps that were ignored.
    pub dropped_timestamps: usize,
    pub output: PathBuf,
    pub bytes: usize,
}

impl ExportSummary {
    pub fn print(&self) {
        println!(
            "Wrote {} event(s) from {} task(s) to {}",
            self.entries,
            self.records,
            self.output.display()
        );
        if self.dropped_timestamps > 0 {
            println!(
                "Ignored {} unpaired timestamp(s) (interval still running?)",
                self.dropped_timestamps
            );
        }
    }
}

/// Runs the export with the store configured in `config`.
pub async fn run(config: &AppConfig, ctx: &RunContext) -> ClientResult<ExportSummary> {
    let store = CouchStore::new(config.store.to_couch_config()?).map_err(store_error)?;
    export(&store, &config.export.output, ctx).await
}

/// Fetches, synthesizes, serializes and writes.
#[instrument(skip_all, fields(store = store.name(), output = %output.display()))]
pub async fn export(
    store: &dyn TaskStore,
    output: &Path,
    ctx: &RunContext,
) -> ClientResult<ExportSummary> {
    let records = store.find_tasks(ctx).await.map_err(store_error)?;
    let synthesis = synthesize(&records)?;
    let ics = serialize_entries(&synthesis.entries)?;

    write_atomic(output, ics.as_bytes()).await?;

    let summary = ExportSummary {
        records: records.len(),
        entries: synthesis.entries.len(),
        untracked_records: synthesis.untracked_records,
        dropped_timestamps: synthesis.dropped_timestamps,
        output: output.to_path_buf(),
        bytes: ics.len(),
    };
    info!(
        records = summary.records,
        entries = summary.entries,
        untracked = summary.untracked_records,
        dropped = summary.dropped_timestamps,
        bytes = summary.bytes,
        "export written"
    );
    Ok(summary)
}

fn store_error(err: ProviderError) -> ClientError {
    if err.code().is_interruption() {
        ClientError::Interrupted(err.to_string())
    } else {
        ClientError::Store(err)
    }
}

/// Writes `contents` to `<path>.tmp`, then renames it over `path`.
///
/// Readers see either the previous file or the complete new one.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> ClientResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        discard(&tmp).await;
        return Err(ClientError::io(&tmp, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        discard(&tmp).await;
        return Err(ClientError::io(path, e));
    }
    Ok(())
}

/// Removes a leftover temporary file, if one was created.
async fn discard(tmp: &Path) {
    match tokio::fs::remove_file(tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %tmp.display(), error = %e, "failed to remove temporary file"),
    }
}

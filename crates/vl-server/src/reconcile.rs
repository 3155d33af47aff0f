//! Startup reconciliation of staged writes.
//!
//! Removes transcode outputs whose video row never committed, then empties
//! the staging area. Must run before the server accepts requests.

use serde::Serialize;
use vl_av::janitor::{remove_quietly, sweep_dir};
use vl_core::Result;
use vl_db::pool::{get_conn, DbPool};
use vl_db::queries::{pending_outputs, videos};

use crate::storage::Storage;

/// What a reconciliation pass removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Markers with no referencing video (file removed if present).
    pub orphaned_outputs: usize,
    /// Markers whose video did commit (marker only removed).
    pub stale_markers: usize,
    /// Files swept from `staging/`.
    pub staging_files: usize,
}

pub fn reconcile(db: &DbPool, storage: &Storage) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let conn = get_conn(db)?;

    for marker in pending_outputs::list_pending(&conn)? {
        if videos::is_path_referenced(&conn, &marker.path)? {
            report.stale_markers += 1;
        } else {
            match storage.resolve(&marker.path) {
                Ok(path) => remove_quietly(&path),
                Err(e) => tracing::warn!(path = %marker.path, "skipping unsafe pending path: {e}"),
            }
            report.orphaned_outputs += 1;
        }
        pending_outputs::clear_pending(&conn, &marker.path)?;
    }

    report.staging_files = sweep_dir(&storage.staging_dir())?;

    if report != ReconcileReport::default() {
        tracing::info!(
            orphaned = report.orphaned_outputs,
            stale = report.stale_markers,
            staging = report.staging_files,
            "reconciled storage"
        );
    }
    Ok(report)
}

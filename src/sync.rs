//! Incremental reconcile of the remote catalog against the local store.
//!
//! One run diffs the remote folder population against the catalog, then
//! walks each missing folder through detail refresh, agenda listing, file
//! metadata, download, and text extraction. Every remote call and file write
//! is fault-isolated per item: a bad folder or document is logged and
//! skipped, never aborting the batch. Folder writes are upserts and
//! agenda/file writes are insert-once, so re-running is safe and a failed
//! item is picked up again on a later run.

use anyhow::{anyhow, Context, Result};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::extract::TextExtractor;
use crate::models::{
    AgendaItem, FileRecord, Folder, RemoteFolderSummary, SessionKind, SyncReport,
};
use crate::remote::RemoteSource;

/// Cooperative cancellation flag, checked between per-item steps so an
/// interrupted run stops cleanly at an item boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run one reconcile against the configured catalog and print a summary.
pub async fn run_sync(
    config: &Config,
    remote: &dyn RemoteSource,
    extractor: &dyn TextExtractor,
    cancel: &CancelFlag,
) -> Result<SyncReport> {
    let pool = db::connect(config).await?;
    let report = reconcile(config, &pool, remote, extractor, cancel).await;
    pool.close().await;
    let report = report?;

    println!("sync");
    println!("  remote folders: {}", report.remote_folders);
    println!("  new folders: {}", report.missing_folders);
    println!("  folders stored: {}", report.folders_added);
    println!("  folders failed: {}", report.folders_failed);
    if report.folders_skipped_unknown > 0 {
        println!(
            "  folders with unknown session type: {}",
            report.folders_skipped_unknown
        );
    }
    println!("  agenda items stored: {}", report.agenda_items_added);
    println!("  files stored: {}", report.files_added);
    println!("  files failed: {}", report.files_failed);
    println!("  documents extracted: {}", report.documents_extracted);
    println!("  extraction failures: {}", report.extraction_failures);
    if report.cancelled {
        println!("  cancelled before completion");
    }
    println!("ok");

    Ok(report)
}

/// Enumerate the remote side and report what a sync would fetch, without
/// writing anything.
pub async fn run_dry_run(config: &Config, remote: &dyn RemoteSource) -> Result<()> {
    let pool = db::connect(config).await?;
    let known = catalog::known_folder_uuids(&pool)
        .await
        .context("Failed to load known folders from the catalog")?;
    pool.close().await;

    let summaries = fetch_remote_folders(remote).await?;
    let missing = summaries
        .iter()
        .filter(|s| !known.contains(&s.uuid))
        .count();

    println!("sync (dry-run)");
    println!("  remote folders: {}", summaries.len());
    println!("  known locally: {}", known.len());
    println!("  would fetch: {}", missing);

    Ok(())
}

/// The reconcile core, separated from pool lifecycle for testability.
pub async fn reconcile(
    config: &Config,
    pool: &SqlitePool,
    remote: &dyn RemoteSource,
    extractor: &dyn TextExtractor,
    cancel: &CancelFlag,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let known = catalog::known_folder_uuids(pool)
        .await
        .context("Failed to load known folders from the catalog")?;

    let summaries = fetch_remote_folders(remote).await?;
    report.remote_folders = summaries.len();

    let missing: Vec<RemoteFolderSummary> = summaries
        .into_iter()
        .filter(|s| !known.contains(&s.uuid))
        .collect();
    report.missing_folders = missing.len();

    if missing.is_empty() {
        info!("no new documents");
        return Ok(report);
    }
    info!(count = missing.len(), "new folders discovered");

    for summary in &missing {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        match process_folder(config, pool, remote, extractor, cancel, summary, &mut report).await
        {
            Ok(()) => {}
            Err(e) => {
                report.folders_failed += 1;
                warn!(folder = %summary.uuid, error = %e, "folder skipped");
            }
        }
    }

    remove_staging_tree(&config.corpus.staging_root);

    Ok(report)
}

/// Folder enumeration across every published year. Years are fetched
/// independently; the run is fatal only when the year listing itself is
/// unreachable or no year yields folders at all.
async fn fetch_remote_folders(
    remote: &dyn RemoteSource,
) -> Result<Vec<RemoteFolderSummary>> {
    let years = remote
        .years()
        .await
        .context("Failed to enumerate published years")?;

    let mut summaries = Vec::new();
    let mut failed_years = 0usize;
    for year in &years {
        match remote.folders_for_year(*year).await {
            Ok(folders) => summaries.extend(folders),
            Err(e) => {
                failed_years += 1;
                warn!(year = *year, error = %e, "year listing failed");
            }
        }
    }

    if !years.is_empty() && failed_years == years.len() {
        anyhow::bail!("folder enumeration failed for every published year");
    }

    Ok(summaries)
}

async fn process_folder(
    config: &Config,
    pool: &SqlitePool,
    remote: &dyn RemoteSource,
    extractor: &dyn TextExtractor,
    cancel: &CancelFlag,
    summary: &RemoteFolderSummary,
    report: &mut SyncReport,
) -> Result<()> {
    let detail = remote.folder_detail(&summary.uuid).await?;

    // Detail fields win over the year-listing summary where both exist.
    let folder = Folder {
        folder_uuid: summary.uuid.clone(),
        name: detail.name.clone(),
        date: detail.date.clone().or_else(|| summary.date.clone()),
        time: summary.time.clone(),
        location: detail.location.clone().or_else(|| summary.location.clone()),
        category: summary.category.clone(),
        public_flag: detail
            .public_flag
            .clone()
            .or_else(|| summary.public_flag.clone()),
    };
    catalog::upsert_folder(pool, &folder)
        .await
        .context("Failed to store folder")?;
    report.folders_added += 1;

    let name = folder.name.as_deref().unwrap_or("");
    let agenda = match SessionKind::classify(name) {
        SessionKind::Committee => {
            let session_uuid = detail
                .uuid
                .as_deref()
                .ok_or_else(|| anyhow!("committee folder carries no session id"))?;
            remote.committee_agenda(&summary.uuid, session_uuid).await?
        }
        SessionKind::Plenary => remote.plenary_agenda(&summary.uuid).await?,
        SessionKind::Unknown => {
            warn!(folder = %summary.uuid, name, "unknown session type, agenda not fetched");
            report.folders_skipped_unknown += 1;
            return Ok(());
        }
    };

    for item in &agenda {
        let row = AgendaItem {
            uuid: item.uuid.clone(),
            folder_uuid: summary.uuid.clone(),
            subject: item.name.clone(),
            invite_flag: item.agenda_no.clone(),
            public_flag: item.public_flag.clone(),
        };
        match catalog::insert_agenda_item(pool, &row).await {
            Ok(true) => report.agenda_items_added += 1,
            Ok(false) => {}
            Err(e) => warn!(agenda = %item.uuid, error = %e, "agenda item not stored"),
        }
    }

    for item in &agenda {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        if item.is_invite() {
            continue;
        }

        if let Err(e) =
            process_agenda_files(config, pool, remote, extractor, &summary.uuid, &item.uuid, report)
                .await
        {
            warn!(agenda = %item.uuid, error = %e, "file listing skipped");
        }
    }

    Ok(())
}

async fn process_agenda_files(
    config: &Config,
    pool: &SqlitePool,
    remote: &dyn RemoteSource,
    extractor: &dyn TextExtractor,
    folder_uuid: &str,
    agenda_uuid: &str,
    report: &mut SyncReport,
) -> Result<()> {
    let files = remote.agenda_files(folder_uuid, agenda_uuid).await?;

    for entry in files {
        let Some(name) = entry.name.clone() else {
            warn!(file = %entry.uuid, "file entry carries no name");
            continue;
        };

        let record = FileRecord {
            uuid: entry.uuid.clone(),
            folder_uuid: folder_uuid.to_string(),
            agenda_uuid: agenda_uuid.to_string(),
            name,
            public_flag: entry.public_flag.clone(),
        };

        let inserted = match catalog::insert_file(pool, &record).await {
            Ok(inserted) => inserted,
            Err(e) => {
                warn!(file = %record.uuid, error = %e, "file metadata not stored");
                continue;
            }
        };
        if !inserted {
            // Seen in an earlier run; its artifact was handled then.
            continue;
        }
        report.files_added += 1;

        let bytes = match remote.download(&record.uuid, &record.name).await {
            Ok(bytes) => bytes,
            Err(e) => {
                report.files_failed += 1;
                warn!(file = %record.uuid, name = %record.name, error = %e, "download failed");
                continue;
            }
        };

        match stage_and_extract(config, extractor, &record, &bytes) {
            Ok(()) => report.documents_extracted += 1,
            Err(e) => {
                report.extraction_failures += 1;
                warn!(file = %record.uuid, name = %record.name, error = %e, "no text artifact produced");
            }
        }
    }

    Ok(())
}

/// Write the raw bytes to the staging tree, convert them, and persist the
/// text artifact. The artifact exists only when both steps succeed.
fn stage_and_extract(
    config: &Config,
    extractor: &dyn TextExtractor,
    record: &FileRecord,
    bytes: &[u8],
) -> Result<()> {
    let staging_path = document_path(
        &config.corpus.staging_root,
        &record.folder_uuid,
        &record.agenda_uuid,
        &record.name,
    );
    write_file(&staging_path, bytes)?;

    let text = extractor.extract(&record.name, bytes)?;

    let artifact_path = document_path(
        &config.corpus.text_root,
        &record.folder_uuid,
        &record.agenda_uuid,
        &artifact_name(&record.name),
    );
    write_file(&artifact_path, text.as_bytes())?;

    Ok(())
}

fn document_path(root: &Path, folder_uuid: &str, agenda_uuid: &str, file_name: &str) -> PathBuf {
    root.join(folder_uuid).join(agenda_uuid).join(file_name)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Text artifacts take the published file name with a `.txt` extension.
fn artifact_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => format!("{stem}.txt"),
        _ => format!("{file_name}.txt"),
    }
}

/// Remove the transient staging tree. Failure is logged, not fatal.
fn remove_staging_tree(staging_root: &Path) {
    if !staging_root.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(staging_root) {
        warn!(path = %staging_root.display(), error = %e, "failed to remove staging tree");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_name_swaps_extension() {
        assert_eq!(artifact_name("minutes.pdf"), "minutes.txt");
        assert_eq!(artifact_name("Előterjesztés.PDF"), "Előterjesztés.txt");
    }

    #[test]
    fn artifact_name_handles_missing_extension() {
        assert_eq!(artifact_name("minutes"), "minutes.txt");
        assert_eq!(artifact_name(".hidden"), ".hidden.txt");
    }

    #[test]
    fn cancel_flag_roundtrip() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let observer = flag.clone();
        flag.cancel();
        assert!(observer.is_cancelled());
    }
}

//! SQLite pool construction for the catalog and the index artifact.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::config::Config;

/// Open the catalog database, creating the file and its parent directory on
/// first use.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open a writable pool on an index file being built. Uses a rollback
/// journal rather than WAL so the finished artifact is a single file that
/// can be renamed into place.
pub async fn open_index_writer(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open index writer at {}", path.display()))?;

    Ok(pool)
}

/// Open a committed index snapshot read-only. The returned pool keeps its
/// file handle across an index swap, so an in-flight search never observes
/// a partially written replacement.
pub async fn open_index_reader(path: &Path) -> Result<SqlitePool> {
    if !path.exists() {
        anyhow::bail!(
            "search index not found at {} — run `csr reindex` first",
            path.display()
        );
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open search index at {}", path.display()))?;

    Ok(pool)
}

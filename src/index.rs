//! Full rebuild of the search index over the extracted-text corpus.
//!
//! The index is a standalone SQLite file holding one row per text artifact:
//! the file name, the owning folder's date (ISO, sortable), the folder and
//! agenda uuids for catalog joins, the artifact's relative path, and the
//! normalized content the search engine scans. A rebuild always observes the
//! whole corpus tree; it writes a fresh `{path}.tmp` file and renames it
//! over the committed index only once fully written, so concurrent readers
//! see either the old or the new index, never a mix.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::models::parse_remote_date;

/// One searchable record derived from one text artifact.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub file_name: String,
    pub date: NaiveDate,
    pub folder_uuid: String,
    pub agenda_uuid: String,
    /// Artifact path relative to the corpus text root.
    pub path: String,
    pub content: String,
}

/// Rebuild the index from the corpus tree and the catalog. Returns the
/// number of indexed documents.
pub async fn rebuild_index(config: &Config, pool: &SqlitePool) -> Result<u64> {
    let entries = collect_entries(&config.corpus.text_root, pool).await?;
    write_index(&config.index.path, &entries).await?;
    Ok(entries.len() as u64)
}

/// Walk `{text_root}/{folder}/{agenda}/{file}` in sorted order and pair each
/// artifact with its folder's date. Artifacts whose folder is missing from
/// the catalog or carries an unparseable date are skipped with a warning;
/// they reappear on the next rebuild once the catalog is corrected.
async fn collect_entries(text_root: &Path, pool: &SqlitePool) -> Result<Vec<IndexEntry>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(text_root)
        .min_depth(3)
        .max_depth(3)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    let mut folder_dates: HashMap<String, Option<NaiveDate>> = HashMap::new();
    let mut entries = Vec::new();

    for path in paths {
        let relative = match path.strip_prefix(text_root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let mut components = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string());
        let (Some(folder_uuid), Some(agenda_uuid), Some(file_name)) =
            (components.next(), components.next(), components.next())
        else {
            continue;
        };

        let date = match folder_dates.get(&folder_uuid) {
            Some(cached) => *cached,
            None => {
                let resolved = resolve_folder_date(pool, &folder_uuid).await?;
                folder_dates.insert(folder_uuid.clone(), resolved);
                resolved
            }
        };
        let Some(date) = date else {
            warn!(folder = %folder_uuid, file = %file_name, "no usable folder date, artifact not indexed");
            continue;
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable artifact not indexed");
                continue;
            }
        };

        entries.push(IndexEntry {
            file_name,
            date,
            folder_uuid,
            agenda_uuid,
            path: relative.to_string_lossy().replace('\\', "/"),
            content: normalize(&raw),
        });
    }

    Ok(entries)
}

async fn resolve_folder_date(pool: &SqlitePool, folder_uuid: &str) -> Result<Option<NaiveDate>> {
    let folder = catalog::folder_by_uuid(pool, folder_uuid)
        .await
        .context("Failed to look up folder for indexing")?;
    Ok(folder
        .and_then(|f| f.date)
        .as_deref()
        .and_then(parse_remote_date))
}

/// Flatten raw artifact text into the indexed form: control characters
/// (including the page-break form feeds the extractor writes) are stripped,
/// lines are trimmed, blank lines dropped, and the remainder joined with
/// single spaces. Line boundaries survive only in the artifact itself, which
/// snippet extraction re-reads.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
        .collect();
    let parts: Vec<&str> = cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    parts.join(" ")
}

async fn write_index(index_path: &Path, entries: &[IndexEntry]) -> Result<()> {
    if let Some(parent) = index_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut tmp_os = index_path.as_os_str().to_owned();
    tmp_os.push(".tmp");
    let tmp_path = PathBuf::from(tmp_os);
    if tmp_path.exists() {
        std::fs::remove_file(&tmp_path)
            .with_context(|| format!("Failed to clear stale {}", tmp_path.display()))?;
    }

    let pool = db::open_index_writer(&tmp_path).await?;

    sqlx::query(
        r#"
        CREATE TABLE entries (
            id INTEGER PRIMARY KEY,
            file_name TEXT NOT NULL,
            date TEXT NOT NULL,
            folder_uuid TEXT NOT NULL,
            agenda_uuid TEXT NOT NULL,
            path TEXT NOT NULL,
            content TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX idx_entries_date ON entries(date DESC)")
        .execute(&pool)
        .await?;

    let mut tx = pool.begin().await?;
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO entries (file_name, date, folder_uuid, agenda_uuid, path, content)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.file_name)
        .bind(entry.date.format("%Y-%m-%d").to_string())
        .bind(&entry.folder_uuid)
        .bind(&entry.agenda_uuid)
        .bind(&entry.path)
        .bind(&entry.content)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    pool.close().await;

    std::fs::rename(&tmp_path, index_path)
        .with_context(|| format!("Failed to swap index into {}", index_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_joins_trimmed_lines() {
        let raw = "  Első sor  \n\n\tMásodik sor\n   \n Harmadik ";
        assert_eq!(normalize(raw), "Első sor Második sor Harmadik");
    }

    #[test]
    fn normalize_strips_page_break_control_characters() {
        let raw = "page one\u{c}\npage two\u{c}";
        assert_eq!(normalize(raw), "page one page two");
    }

    #[test]
    fn normalize_of_blank_input_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n \n\t\n\u{c}"), "");
    }

    #[test]
    fn normalize_is_deterministic() {
        let raw = "a\nb\nc\n";
        assert_eq!(normalize(raw), normalize(raw));
        assert_eq!(normalize(raw), "a b c");
    }
}

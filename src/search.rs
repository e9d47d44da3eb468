//! Pattern search over the document index.
//!
//! A query compiles to a literal predicate (substring by default, whole
//! token with `--exact`), scans every indexed document's normalized content,
//! and ranks matches by folder date, newest first. Statistics cover the full
//! match set; the caller's session-name allow-list narrows only what is
//! returned for display. Each rendered hit re-reads its raw text artifact to
//! show the lines around the first match.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::error::QueryError;

/// Lines of context kept on each side of the first matching line.
const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub pattern: String,
    /// Match whole tokens only instead of any substring.
    pub exact: bool,
    /// Session names allowed in the rendered result list; `None` renders
    /// every match.
    pub selected_names: Option<BTreeSet<String>>,
}

#[derive(Debug)]
pub struct SearchResponse {
    /// Count of all indexed documents, matched or not.
    pub total_files: u64,
    /// Count of matching documents before the name filter.
    pub matched_files: u64,
    pub percentage_matched: f64,
    /// Wall-clock duration of the index scan.
    pub elapsed: Duration,
    pub results: Vec<SearchHit>,
}

#[derive(Debug)]
pub struct SearchHit {
    pub date: NaiveDate,
    pub session_name: Option<String>,
    pub agenda_subject: Option<String>,
    pub file_name: String,
    /// Absolute path of the raw text artifact backing this hit.
    pub file_path: PathBuf,
    /// Context lines around the first match, when the artifact is readable.
    pub snippet: Option<String>,
    /// Per-result integrity fault, e.g. the index references an artifact
    /// that no longer exists on disk.
    pub warning: Option<String>,
}

/// Compile the user pattern into the match predicate. The pattern text is
/// always escaped; `exact` wraps it in word boundaries so it only matches a
/// whole token.
pub fn compile_pattern(pattern: &str, exact: bool) -> Result<Regex, QueryError> {
    let escaped = regex::escape(pattern);
    let full = if exact {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    };
    Ok(Regex::new(&full)?)
}

/// Run one search against the committed index snapshot.
pub async fn run_search(config: &Config, request: &SearchRequest) -> Result<SearchResponse> {
    let regex = compile_pattern(&request.pattern, request.exact)?;

    let index_pool = db::open_index_reader(&config.index.path).await?;
    let catalog_pool = db::connect(config).await?;

    let response = search_index(config, &index_pool, &catalog_pool, &regex, request).await;

    index_pool.close().await;
    catalog_pool.close().await;
    response
}

#[derive(Debug)]
struct MatchRow {
    file_name: String,
    date: NaiveDate,
    folder_uuid: String,
    agenda_uuid: String,
    path: String,
}

async fn search_index(
    config: &Config,
    index_pool: &SqlitePool,
    catalog_pool: &SqlitePool,
    regex: &Regex,
    request: &SearchRequest,
) -> Result<SearchResponse> {
    let rows = sqlx::query(
        "SELECT file_name, date, folder_uuid, agenda_uuid, path, content FROM entries",
    )
    .fetch_all(index_pool)
    .await
    .context("Failed to scan the search index")?;

    let started = Instant::now();
    let total_files = rows.len() as u64;
    let mut matches: Vec<MatchRow> = Vec::new();

    for row in &rows {
        let content: String = row.get("content");
        if !regex.is_match(&content) {
            continue;
        }

        let raw_date: String = row.get("date");
        let Ok(date) = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d") else {
            warn!(date = %raw_date, "index entry carries an unreadable date");
            continue;
        };

        matches.push(MatchRow {
            file_name: row.get("file_name"),
            date,
            folder_uuid: row.get("folder_uuid"),
            agenda_uuid: row.get("agenda_uuid"),
            path: row.get("path"),
        });
    }

    let elapsed = started.elapsed();
    let matched_files = matches.len() as u64;
    let percentage_matched = percentage(matched_files, total_files);

    sort_matches(&mut matches);

    let mut results = Vec::new();
    for entry in &matches {
        let folder = catalog::folder_by_uuid(catalog_pool, &entry.folder_uuid).await?;
        let session_name = folder.and_then(|f| f.name);

        if let Some(selected) = &request.selected_names {
            match session_name.as_deref() {
                Some(name) if selected.contains(name) => {}
                _ => continue,
            }
        }

        let agenda_subject = catalog::agenda_subject(catalog_pool, &entry.agenda_uuid).await?;
        let file_path = config.corpus.text_root.join(&entry.path);

        let (snippet, warning) = match extract_snippet(&file_path, regex) {
            Ok(Some(snippet)) => (Some(snippet), None),
            Ok(None) => (
                None,
                Some("pattern matched the index but no artifact line".to_string()),
            ),
            Err(e) => {
                warn!(path = %file_path.display(), error = %e, "stale index entry, artifact unreadable");
                (
                    None,
                    Some(format!(
                        "text artifact missing or unreadable ({e}) — reindex to repair"
                    )),
                )
            }
        };

        results.push(SearchHit {
            date: entry.date,
            session_name,
            agenda_subject,
            file_name: entry.file_name.clone(),
            file_path,
            snippet,
            warning,
        });
    }

    Ok(SearchResponse {
        total_files,
        matched_files,
        percentage_matched,
        elapsed,
        results,
    })
}

fn percentage(matched: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64 * 100.0
    }
}

/// Date descending; equal dates order by artifact path so results are
/// stable no matter how the index was written.
fn sort_matches(matches: &mut [MatchRow]) {
    matches.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
}

/// Re-read the raw artifact and pull the context window around the first
/// line the pattern matches. `Ok(None)` means the pattern only matched
/// across the index's joined lines.
fn extract_snippet(path: &Path, regex: &Regex) -> std::io::Result<Option<String>> {
    let raw = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = raw.lines().collect();
    Ok(lines
        .iter()
        .position(|line| regex.is_match(line))
        .map(|matched| context_window(&lines, matched)))
}

/// Up to [`CONTEXT_LINES`] lines either side of the matching line, clamped
/// to the file, joined and trimmed.
fn context_window(lines: &[&str], matched: usize) -> String {
    let start = matched.saturating_sub(CONTEXT_LINES);
    let end = (matched + CONTEXT_LINES + 1).min(lines.len());
    lines[start..end].join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_pattern_matches_inside_words() {
        let regex = compile_pattern("t", false).unwrap();
        assert!(regex.is_match("testing"));
        assert!(regex.is_match("test tt t"));
    }

    #[test]
    fn exact_pattern_requires_a_whole_token() {
        let regex = compile_pattern("t", true).unwrap();
        assert!(regex.is_match("test tt t"));
        assert!(!regex.is_match("testing"));
    }

    #[test]
    fn pattern_text_is_taken_literally() {
        let regex = compile_pattern("a.b", false).unwrap();
        assert!(regex.is_match("a.b"));
        assert!(!regex.is_match("axb"));
    }

    #[test]
    fn percentage_is_bounded_and_zero_on_empty() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(0, 4), 0.0);
        assert_eq!(percentage(4, 4), 100.0);
        let p = percentage(1, 3);
        assert!(p > 0.0 && p < 100.0);
    }

    #[test]
    fn matches_order_by_date_descending() {
        let row = |date: (i32, u32, u32), path: &str| MatchRow {
            file_name: "f.txt".into(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            folder_uuid: "f".into(),
            agenda_uuid: "a".into(),
            path: path.into(),
        };
        let mut matches = vec![
            row((2024, 1, 10), "a"),
            row((2024, 3, 1), "b"),
            row((2024, 2, 15), "c"),
        ];
        sort_matches(&mut matches);
        let dates: Vec<_> = matches.iter().map(|m| m.date.to_string()).collect();
        assert_eq!(dates, ["2024-03-01", "2024-02-15", "2024-01-10"]);
    }

    #[test]
    fn equal_dates_order_by_path() {
        let row = |path: &str| MatchRow {
            file_name: "f.txt".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            folder_uuid: "f".into(),
            agenda_uuid: "a".into(),
            path: path.into(),
        };
        let mut matches = vec![row("z/2.txt"), row("a/1.txt"), row("m/3.txt")];
        sort_matches(&mut matches);
        let paths: Vec<_> = matches.iter().map(|m| m.path.clone()).collect();
        assert_eq!(paths, ["a/1.txt", "m/3.txt", "z/2.txt"]);
    }

    #[test]
    fn context_window_spans_three_lines_each_side() {
        let lines: Vec<String> = (0..10).map(|i| format!("l{i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let window = context_window(&refs, 5);
        assert_eq!(window, "l2\nl3\nl4\nl5\nl6\nl7\nl8");
    }

    #[test]
    fn context_window_clamps_at_file_start() {
        let lines = ["l0", "l1", "l2", "l3", "l4"];
        let window = context_window(&lines, 0);
        assert_eq!(window, "l0\nl1\nl2\nl3");
    }

    #[test]
    fn context_window_clamps_at_file_end() {
        let lines = ["l0", "l1", "l2", "l3", "l4"];
        let window = context_window(&lines, 4);
        assert_eq!(window, "l1\nl2\nl3\nl4");
    }
}

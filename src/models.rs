//! Core data types for the harvesting and search pipeline.
//!
//! The `Remote*` structs mirror the JSON the municipal API actually sends
//! (Hungarian field names, everything stringly typed); the catalog structs
//! are what we persist. Flag values such as `napirend` and
//! `nyilvanossagjelolo` are opaque remote enumerations and are stored
//! verbatim.

use chrono::NaiveDate;
use serde::Deserialize;

/// Date format used by the remote source, e.g. `2024.03.01.`.
pub const REMOTE_DATE_FORMAT: &str = "%Y.%m.%d.";

/// Parse a folder date as published by the remote source.
pub fn parse_remote_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), REMOTE_DATE_FORMAT).ok()
}

/// Session type derived from a folder's name, which selects the agenda
/// listing route. Anything unrecognized is skipped with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Committee,
    Plenary,
    Unknown,
}

impl SessionKind {
    pub fn classify(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.contains("bizottság") {
            SessionKind::Committee
        } else if name == "képviselő-testület" {
            SessionKind::Plenary
        } else {
            SessionKind::Unknown
        }
    }
}

/// JSON envelope every remote endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub content: T,
}

/// One folder summary from the per-year listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFolderSummary {
    pub uuid: String,
    #[serde(rename = "datum")]
    pub date: Option<String>,
    #[serde(rename = "nyilvanossagjelolo")]
    pub public_flag: Option<String>,
    #[serde(rename = "kategoria")]
    pub category: Option<String>,
    #[serde(rename = "idopont")]
    pub time: Option<String>,
    #[serde(rename = "hely")]
    pub location: Option<String>,
}

/// Folder detail record. `uuid` here is the *session* identifier the
/// committee agenda route needs as its second parameter, not the folder's.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFolderDetail {
    pub uuid: Option<String>,
    #[serde(rename = "nev")]
    pub name: Option<String>,
    #[serde(rename = "datum")]
    pub date: Option<String>,
    #[serde(rename = "hely")]
    pub location: Option<String>,
    #[serde(rename = "nyilvanossagjelolo")]
    pub public_flag: Option<String>,
}

/// One agenda entry of a session.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAgendaItem {
    pub uuid: String,
    pub name: Option<String>,
    #[serde(rename = "napirend")]
    pub agenda_no: Option<String>,
    #[serde(rename = "nyilvanossagjelolo")]
    pub public_flag: Option<String>,
}

impl RemoteAgendaItem {
    /// `napirend == "0"` marks the invite entry, which carries no
    /// downloadable documents.
    pub fn is_invite(&self) -> bool {
        self.agenda_no.as_deref() == Some("0")
    }
}

/// One attached-file entry of an agenda item.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFileEntry {
    pub uuid: String,
    pub name: Option<String>,
    #[serde(rename = "nyilvanossagjelolo")]
    pub public_flag: Option<String>,
}

/// One meeting/session as stored in the catalog.
#[derive(Debug, Clone)]
pub struct Folder {
    pub folder_uuid: String,
    pub name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub public_flag: Option<String>,
}

/// One agenda point as stored in the catalog.
#[derive(Debug, Clone)]
pub struct AgendaItem {
    pub uuid: String,
    pub folder_uuid: String,
    pub subject: Option<String>,
    pub invite_flag: Option<String>,
    pub public_flag: Option<String>,
}

/// Metadata for one attached document as stored in the catalog.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub uuid: String,
    pub folder_uuid: String,
    pub agenda_uuid: String,
    pub name: String,
    pub public_flag: Option<String>,
}

/// Outcome counters for one reconcile run.
#[derive(Debug, Default, Clone)]
pub struct SyncReport {
    /// Folder identifiers seen remotely across all published years.
    pub remote_folders: usize,
    /// Remote folders absent from the local catalog at the start of the run.
    pub missing_folders: usize,
    pub folders_added: usize,
    pub folders_failed: usize,
    pub folders_skipped_unknown: usize,
    pub agenda_items_added: usize,
    pub files_added: usize,
    pub files_failed: usize,
    pub documents_extracted: usize,
    pub extraction_failures: usize,
    /// Set when the run stopped early at a cancellation point.
    pub cancelled: bool,
}

impl SyncReport {
    /// True when the run produced at least one new text artifact, meaning
    /// the committed index no longer covers the corpus.
    pub fn needs_reindex(&self) -> bool {
        self.documents_extracted > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote_date_format() {
        let date = parse_remote_date("2024.03.01.").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn rejects_other_date_formats() {
        assert!(parse_remote_date("2024-03-01").is_none());
        assert!(parse_remote_date("").is_none());
    }

    #[test]
    fn classifies_committee_sessions_by_substring() {
        assert_eq!(
            SessionKind::classify("Gazdasági Bizottság"),
            SessionKind::Committee
        );
        assert_eq!(
            SessionKind::classify("KULTURÁLIS BIZOTTSÁG"),
            SessionKind::Committee
        );
    }

    #[test]
    fn classifies_plenary_sessions_by_full_name() {
        assert_eq!(
            SessionKind::classify("Képviselő-testület"),
            SessionKind::Plenary
        );
        // Substring is not enough for the plenary body
        assert_eq!(
            SessionKind::classify("Képviselő-testület rendkívüli"),
            SessionKind::Unknown
        );
    }

    #[test]
    fn unknown_session_names_are_flagged() {
        assert_eq!(SessionKind::classify("Közgyűlés"), SessionKind::Unknown);
        assert_eq!(SessionKind::classify(""), SessionKind::Unknown);
    }

    #[test]
    fn invite_flag_is_the_literal_zero() {
        let item = |agenda_no: Option<&str>| RemoteAgendaItem {
            uuid: "u".into(),
            name: None,
            agenda_no: agenda_no.map(String::from),
            public_flag: None,
        };
        assert!(item(Some("0")).is_invite());
        assert!(!item(Some("1")).is_invite());
        assert!(!item(Some("00")).is_invite());
        assert!(!item(None).is_invite());
    }
}

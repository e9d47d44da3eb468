//! Catalog store access layer.
//!
//! All reads and writes go through parameter binding; the remote-supplied
//! uuids are the primary keys. Folder writes are upserts (a detail refresh
//! overwrites every non-key field), agenda items and files are insert-once.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

use crate::models::{AgendaItem, FileRecord, Folder};

/// All folder uuids currently known locally.
pub async fn known_folder_uuids(pool: &SqlitePool) -> Result<HashSet<String>> {
    let rows = sqlx::query_scalar::<_, String>("SELECT folder_uuid FROM folders")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn upsert_folder(pool: &SqlitePool, folder: &Folder) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO folders (folder_uuid, name, date, time, location, category, public_flag)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(folder_uuid) DO UPDATE SET
            name = excluded.name,
            date = excluded.date,
            time = excluded.time,
            location = excluded.location,
            category = excluded.category,
            public_flag = excluded.public_flag
        "#,
    )
    .bind(&folder.folder_uuid)
    .bind(&folder.name)
    .bind(&folder.date)
    .bind(&folder.time)
    .bind(&folder.location)
    .bind(&folder.category)
    .bind(&folder.public_flag)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert an agenda item unless its uuid is already present. Returns whether
/// a row was written.
pub async fn insert_agenda_item(pool: &SqlitePool, item: &AgendaItem) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO agenda_items (uuid, folder_uuid, subject, invite_flag, public_flag)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(uuid) DO NOTHING
        "#,
    )
    .bind(&item.uuid)
    .bind(&item.folder_uuid)
    .bind(&item.subject)
    .bind(&item.invite_flag)
    .bind(&item.public_flag)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert file metadata unless its uuid is already present. Returns whether
/// a row was written; a prior row means the document was already fetched.
pub async fn insert_file(pool: &SqlitePool, record: &FileRecord) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO files (uuid, folder_uuid, agenda_uuid, name, public_flag)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(uuid) DO NOTHING
        "#,
    )
    .bind(&record.uuid)
    .bind(&record.folder_uuid)
    .bind(&record.agenda_uuid)
    .bind(&record.name)
    .bind(&record.public_flag)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn folder_by_uuid(pool: &SqlitePool, folder_uuid: &str) -> Result<Option<Folder>> {
    let row = sqlx::query(
        "SELECT folder_uuid, name, date, time, location, category, public_flag FROM folders WHERE folder_uuid = ?",
    )
    .bind(folder_uuid)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Folder {
        folder_uuid: row.get("folder_uuid"),
        name: row.get("name"),
        date: row.get("date"),
        time: row.get("time"),
        location: row.get("location"),
        category: row.get("category"),
        public_flag: row.get("public_flag"),
    }))
}

pub async fn agenda_subject(pool: &SqlitePool, agenda_uuid: &str) -> Result<Option<String>> {
    let subject: Option<Option<String>> =
        sqlx::query_scalar("SELECT subject FROM agenda_items WHERE uuid = ?")
            .bind(agenda_uuid)
            .fetch_optional(pool)
            .await?;

    Ok(subject.flatten())
}

/// Sorted distinct session names, the vocabulary of the search name filter.
pub async fn session_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT name FROM folders WHERE name IS NOT NULL ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(names)
}

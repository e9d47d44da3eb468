use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Folders: one row per published meeting/session. Detail refreshes
    // overwrite every non-key field for the same uuid.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS folders (
            folder_uuid TEXT PRIMARY KEY,
            name TEXT,
            date TEXT,
            time TEXT,
            location TEXT,
            category TEXT,
            public_flag TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Agenda items: insert-once per remote uuid.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agenda_items (
            uuid TEXT PRIMARY KEY,
            folder_uuid TEXT NOT NULL,
            subject TEXT,
            invite_flag TEXT,
            public_flag TEXT,
            FOREIGN KEY (folder_uuid) REFERENCES folders(folder_uuid)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // File metadata: insert-once per remote uuid.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            uuid TEXT PRIMARY KEY,
            folder_uuid TEXT NOT NULL,
            agenda_uuid TEXT NOT NULL,
            name TEXT NOT NULL,
            public_flag TEXT,
            FOREIGN KEY (folder_uuid) REFERENCES folders(folder_uuid),
            FOREIGN KEY (agenda_uuid) REFERENCES agenda_items(uuid)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_agenda_items_folder ON agenda_items(folder_uuid)",
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_folder ON files(folder_uuid)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_agenda ON files(agenda_uuid)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}

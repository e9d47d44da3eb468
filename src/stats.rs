//! Catalog and index overview.
//!
//! A quick summary of what has been harvested and indexed: row counts per
//! catalog table, indexed-document count, file sizes, and the session-name
//! vocabulary the search name filter accepts.

use anyhow::Result;

use crate::catalog;
use crate::config::Config;
use crate::db;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let folders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders")
        .fetch_one(&pool)
        .await?;
    let agenda_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agenda_items")
        .fetch_one(&pool)
        .await?;
    let files: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
        .fetch_one(&pool)
        .await?;
    let names = catalog::session_names(&pool).await?;

    pool.close().await;

    let indexed = match db::open_index_reader(&config.index.path).await {
        Ok(index_pool) => {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
                .fetch_one(&index_pool)
                .await?;
            index_pool.close().await;
            Some(count)
        }
        Err(_) => None,
    };

    let db_size = file_size(&config.db.path);
    let index_size = file_size(&config.index.path);

    println!("Council Search — Overview");
    println!("=========================");
    println!();
    println!("  Catalog:      {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Folders:      {}", folders);
    println!("  Agenda items: {}", agenda_items);
    println!("  Files:        {}", files);
    println!();
    match indexed {
        Some(count) => {
            println!("  Index:        {}", config.index.path.display());
            println!("  Size:         {}", format_bytes(index_size));
            println!("  Documents:    {}", count);
        }
        None => println!("  Index:        not built (run `csr reindex`)"),
    }

    if !names.is_empty() {
        println!();
        println!("  Session names:");
        for name in names {
            println!("    {}", name);
        }
    }
    println!();

    Ok(())
}

fn file_size(path: &std::path::Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

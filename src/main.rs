//! # Council Search CLI (`csr`)
//!
//! The `csr` binary drives the harvesting and search pipeline. It provides
//! commands for catalog initialization, incremental sync against the remote
//! content API, index rebuilds, and full-text search over the harvested
//! corpus.
//!
//! ## Usage
//!
//! ```bash
//! csr --config ./config/csr.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `csr init` | Create the SQLite catalog and run schema migrations |
//! | `csr sync` | Fetch newly published documents; rebuild the index when any arrive |
//! | `csr reindex` | Force a full index rebuild from the corpus |
//! | `csr search "<pattern>"` | Search indexed documents |
//! | `csr stats` | Show catalog and index counts |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the catalog
//! csr init --config ./config/csr.toml
//!
//! # Incremental harvest (skips anything already cataloged)
//! csr sync --config ./config/csr.toml
//!
//! # See what a sync would fetch
//! csr sync --dry-run --config ./config/csr.toml
//!
//! # Substring search, newest meetings first
//! csr search "költségvetés" --config ./config/csr.toml
//!
//! # Whole-token search, narrowed to one committee
//! csr search "terv" --exact --name "Gazdasági Bizottság" --config ./config/csr.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use council_search::search::{SearchRequest, SearchResponse};
use council_search::{config, db, extract, index, migrate, remote, search, stats, sync};

/// Council Search CLI — an incremental harvester and full-text search
/// engine for municipal council meeting documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file with `[db]`, `[remote]`, `[corpus]`, and `[index]` sections.
#[derive(Parser)]
#[command(
    name = "csr",
    about = "Council Search — harvest and search municipal council meeting documents",
    version,
    long_about = "Council Search reconciles the meeting catalog published by a municipal \
    content API against a local SQLite store, downloads newly published documents, extracts \
    their text, and serves full-text pattern search over the harvested corpus from a \
    rebuildable on-disk index."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/csr.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the catalog schema.
    ///
    /// Creates the SQLite catalog file and the folders / agenda_items /
    /// files tables. Idempotent — running it again is safe.
    Init,

    /// Fetch newly published documents from the remote API.
    ///
    /// Diffs the remote folder catalog against the local one, harvests
    /// everything missing (folder details, agenda items, file metadata,
    /// document text), and rebuilds the search index when at least one new
    /// document was extracted. Ctrl-C stops cleanly at the next item
    /// boundary.
    Sync {
        /// Enumerate the remote catalog and report what would be fetched,
        /// without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Leave the index untouched even when new documents arrived.
        #[arg(long)]
        skip_reindex: bool,
    },

    /// Rebuild the search index from the extracted-text corpus.
    ///
    /// Scans the whole corpus tree and writes a fresh index, swapping it in
    /// atomically. Searches running meanwhile keep their snapshot.
    Reindex,

    /// Search indexed documents.
    ///
    /// Scans every indexed document for the pattern and prints matches
    /// newest-first with a few lines of context around the first match.
    Search {
        /// The text to search for. Matched literally, not as a regex.
        pattern: String,

        /// Match whole tokens only (word boundaries on both sides).
        #[arg(long)]
        exact: bool,

        /// Restrict printed results to these session names (repeatable).
        /// Totals still count every match.
        #[arg(long = "name")]
        names: Vec<String>,
    },

    /// Show catalog and index counts.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Catalog initialized successfully.");
        }
        Commands::Sync {
            dry_run,
            skip_reindex,
        } => {
            let remote = remote::HttpRemote::new(&cfg.remote)?;

            if dry_run {
                sync::run_dry_run(&cfg, &remote).await?;
                return Ok(());
            }

            let cancel = sync::CancelFlag::new();
            let ctrl_c_flag = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_flag.cancel();
                }
            });

            let report = sync::run_sync(&cfg, &remote, &extract::PdfExtractor, &cancel).await?;

            if report.needs_reindex() && !skip_reindex {
                let pool = db::connect(&cfg).await?;
                let count = index::rebuild_index(&cfg, &pool).await?;
                pool.close().await;
                println!("index rebuilt: {} documents", count);
            }
        }
        Commands::Reindex => {
            let pool = db::connect(&cfg).await?;
            let count = index::rebuild_index(&cfg, &pool).await?;
            pool.close().await;
            println!("index rebuilt: {} documents", count);
        }
        Commands::Search {
            pattern,
            exact,
            names,
        } => {
            let request = SearchRequest {
                pattern,
                exact,
                selected_names: if names.is_empty() {
                    None
                } else {
                    Some(names.into_iter().collect())
                },
            };
            let response = search::run_search(&cfg, &request).await?;
            print_search(&response);
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}

fn print_search(response: &SearchResponse) {
    println!("Indexed documents: {}", response.total_files);
    println!(
        "Matches: {} documents ({:.2}%)",
        response.matched_files, response.percentage_matched
    );
    println!("Scan time: {:.2} seconds", response.elapsed.as_secs_f64());
    println!();

    if response.results.is_empty() {
        println!("No results.");
        return;
    }

    for hit in &response.results {
        println!(
            "{}",
            hit.session_name.as_deref().unwrap_or("(unknown session)")
        );
        println!("  date: {}", hit.date.format("%Y %m %d"));
        if let Some(subject) = &hit.agenda_subject {
            println!("  agenda item: {}", subject);
        }
        println!("  file: {}", hit.file_name);
        if let Some(snippet) = &hit.snippet {
            println!("  context:");
            for line in snippet.lines() {
                println!("    {}", line);
            }
        }
        if let Some(warning) = &hit.warning {
            println!("  warning: {}", warning);
        }
        println!();
    }
}

//! # Council Search
//!
//! An incremental harvester and full-text search engine for municipal
//! council meeting documents.
//!
//! The remote content API publishes meetings ("folders") with agenda items
//! and attached documents. Council Search reconciles that catalog against a
//! local SQLite store, downloads only newly published documents, extracts
//! their text, and maintains a rebuildable search index over the extracted
//! corpus.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Remote API   │──▶│  Reconciler  │──▶│   Catalog   │
//! │ years/folders│   │ diff + fetch │   │  (SQLite)   │
//! │ agenda/files │   │ + extract    │   └──────┬──────┘
//! └──────────────┘   └──────┬───────┘          │
//!                           ▼                  ▼
//!                    ┌──────────────┐   ┌─────────────┐
//!                    │  Text corpus │──▶│    Index    │
//!                    │ (txt tree)   │   │  (rebuilt)  │
//!                    └──────────────┘   └──────┬──────┘
//!                                              ▼
//!                                       ┌─────────────┐
//!                                       │   Search    │
//!                                       └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! csr init                       # create the catalog
//! csr sync                       # fetch new documents, rebuild the index
//! csr search "költségvetés"      # substring search
//! csr search "terv" --exact      # whole-token search
//! csr stats                      # what's harvested and indexed
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Domain and wire types |
//! | [`remote`] | Remote content API client |
//! | [`catalog`] | Catalog store access layer |
//! | [`extract`] | Document text extraction |
//! | [`sync`] | Incremental reconcile pipeline |
//! | [`index`] | Search index rebuilds |
//! | [`search`] | Pattern search and snippets |
//! | [`db`] | SQLite pool construction |
//! | [`migrate`] | Catalog schema |

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod index;
pub mod migrate;
pub mod models;
pub mod remote;
pub mod search;
pub mod stats;
pub mod sync;

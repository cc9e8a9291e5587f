//! # Estuary
//!
//! A multi-user RSS feed aggregator.
//!
//! ## Architecture
//!
//! The core is a periodic fetch-and-ingest pipeline:
//!
//! ```text
//! Scheduler → Store (select + claim) → Fetcher → Parser → Ingestor → Store
//! ```
//!
//! Each tick, the [`scheduler`] claims the least-recently-fetched feed by
//! stamping its `last_fetched_at` before any network I/O, fetches and parses
//! the RSS document, and writes new posts. Failures are contained per cycle
//! (and per item during ingestion); only startup errors are fatal.
//!
//! ## Quick Start
//!
//! ```bash
//! # Register a user
//! estuary register alice
//!
//! # Register a feed (implicitly follows it)
//! estuary addfeed "Rust Blog" https://blog.rust-lang.org/feed.xml
//!
//! # Run the fetch loop, one feed every 30 seconds
//! estuary agg 30s
//!
//! # Read what arrived
//! estuary browse 10
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires together store, fetcher, ingestor,
/// and config.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Persisted configuration (database path, current user).
pub mod config;

/// Core domain models: [`User`](domain::User), [`Feed`](domain::Feed),
/// [`FeedFollow`](domain::FeedFollow), [`Post`](domain::Post).
pub mod domain;

/// HTTP feed retrieval.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for fetching raw documents
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Best-effort conversion of parsed items into stored posts.
pub mod ingest;

/// RSS 2.0 parsing into channel metadata and raw items.
pub mod parser;

/// The periodic fetch loop: feed selection, claiming, and cycle driving.
pub mod scheduler;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

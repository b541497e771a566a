//! # Folio
//!
//! Browse, search and bookmark books from a remote catalog.
//!
//! ## Architecture
//!
//! A [`BrowseSession`](session::BrowseSession) owns the result state for one
//! user session and publishes it as immutable snapshots:
//!
//! ```text
//! intent → QueryEngine / FavoriteTracker → CatalogClient / FavoritesStore → ViewState
//! ```
//!
//! - [`catalog`]: paginated catalog access (Google Books over reqwest)
//! - [`normalizer`]: maps catalog volumes to [`Book`](domain::Book)s
//! - [`store`]: SQLite-backed favorites with a live list
//! - [`session`]: pagination, stale-response guards and the favorites overlay
//!
//! ## Quick Start
//!
//! ```bash
//! # Trending fiction, two pages
//! folio trending -c fiction -p 2
//!
//! # Search
//! folio search "rust programming"
//!
//! # Toggle a favorite and list them
//! folio favorite zyTCAlFPjgYC
//! folio favorites
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: TOML configuration
//! - [`domain`]: Core domain models (Book, Category, ResultStream)

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the catalog client and
/// favorites store together from [`Config`](config::Config).
pub mod app;

/// Remote catalog access.
///
/// - [`CatalogClient`](catalog::CatalogClient): Async trait for paged and by-id lookups
/// - [`GoogleBooksClient`](catalog::GoogleBooksClient): reqwest-based implementation
pub mod catalog;

/// Command-line interface using clap.
///
/// - `trending [-c category] [-p pages]` - List trending books
/// - `search <query>` - Search the catalog
/// - `show <id>` / `open <id>` - Inspect or open one book
/// - `favorite <id>` / `favorites` - Toggle and list favorites
/// - `categories` - List the categories
pub mod cli;

/// Configuration loaded from `~/.config/folio/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Book`](domain::Book): A catalog entry
/// - [`ResultStream`](domain::ResultStream): Paginated items with their cursor
/// - [`DataState`](domain::DataState): Idle/Loading/Success/Error envelope
pub mod domain;

/// Catalog response parsing and normalization.
pub mod normalizer;

/// Result-state coordination for a browsing session.
pub mod session;

/// Favorites persistence.
///
/// - [`FavoritesStore`](store::FavoritesStore): Trait defining favorite operations
/// - [`SqliteFavoritesStore`](store::SqliteFavoritesStore): SQLite implementation
pub mod store;

#[cfg(test)]
mod testing;

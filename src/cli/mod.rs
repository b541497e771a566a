pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Category;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Browse and search a book catalog from the terminal", long_about = None)]
pub struct Cli {
    /// Path to the favorites database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List trending books for a category
    Trending {
        /// Category to browse (defaults to the configured one)
        #[arg(short, long)]
        category: Option<Category>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },
    /// Search the catalog
    Search {
        /// Free-text query
        query: String,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },
    /// Show one book's details
    Show {
        /// Catalog id of the book
        id: String,
    },
    /// Toggle a book's favorite status
    Favorite {
        /// Catalog id of the book
        id: String,
    },
    /// List favorite books
    Favorites,
    /// Open a book's preview link in the browser
    Open {
        /// Catalog id of the book
        id: String,
    },
    /// List the available categories
    Categories,
}

pub mod google;

use std::fmt;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Book, Category};

pub use google::GoogleBooksClient;

pub const PAGE_SIZE: usize = 20;

/// What a page request is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageQuery {
    Trending(Category),
    Search(String),
}

impl PageQuery {
    /// The `q` parameter sent to the catalog.
    pub fn query_text(&self) -> &str {
        match self {
            PageQuery::Trending(category) => category.query(),
            PageQuery::Search(text) => text,
        }
    }
}

impl fmt::Display for PageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageQuery::Trending(category) => write!(f, "trending:{}", category.slug()),
            PageQuery::Search(text) => write!(f, "search:{}", text),
        }
    }
}

#[async_trait]
pub trait CatalogClient {
    /// Fetch one page of `page_size` books starting at page `page_index`.
    async fn fetch_page(
        &self,
        query: &PageQuery,
        page_index: usize,
        page_size: usize,
    ) -> Result<Vec<Book>>;

    async fn fetch_by_id(&self, id: &str) -> Result<Book>;
}

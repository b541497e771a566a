pub mod sqlite;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::app::Result;
use crate::domain::Book;

pub use sqlite::SqliteFavoritesStore;

#[async_trait]
pub trait FavoritesStore {
    /// Live list of favorites: the current list first, then the full list
    /// again after every change. Ends when the store is dropped.
    fn observe_all(&self) -> BoxStream<'static, Vec<Book>>;

    async fn all(&self) -> Result<Vec<Book>>;
    async fn is_favorite(&self, id: &str) -> Result<bool>;
    async fn add(&self, book: &Book) -> Result<()>;
    async fn remove(&self, id: &str) -> Result<()>;

    /// Add the book if absent, remove it if present. Returns the new status.
    async fn toggle(&self, book: &Book) -> Result<bool>;
}

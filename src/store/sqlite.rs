use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};
use tokio::sync::watch;

use crate::app::{FolioError, Result};
use crate::domain::Book;
use crate::store::FavoritesStore;

const INITIAL_SCHEMA: &str = "
CREATE TABLE favorite_books (
    id        TEXT PRIMARY KEY NOT NULL,
    title     TEXT NOT NULL,
    book_json TEXT NOT NULL,
    added_at  TEXT NOT NULL
);
CREATE INDEX idx_favorite_books_added_at ON favorite_books (added_at);
";

pub struct SqliteFavoritesStore {
    conn: Mutex<Connection>,
    live: watch::Sender<Vec<Book>>,
}

impl SqliteFavoritesStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        let migrations = Migrations::new(vec![M::up(INITIAL_SCHEMA)]);
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FolioError::Other(format!("Migration failed: {}", e)))?;

        let initial = Self::query_all(&conn)?;
        let (live, _) = watch::channel(initial);

        Ok(Self {
            conn: Mutex::new(conn),
            live,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            FolioError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn query_all(conn: &Connection) -> Result<Vec<Book>> {
        let mut stmt = conn.prepare(
            "SELECT book_json FROM favorite_books ORDER BY added_at DESC, rowid DESC",
        )?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut books = Vec::with_capacity(rows.len());
        for json in rows {
            match serde_json::from_str::<Book>(&json) {
                Ok(book) => books.push(book),
                Err(e) => tracing::warn!("Skipping unreadable favorite row: {}", e),
            }
        }
        Ok(books)
    }

    fn insert(conn: &Connection, book: &Book) -> Result<()> {
        let json = serde_json::to_string(book)?;
        conn.execute(
            "INSERT OR REPLACE INTO favorite_books (id, title, book_json, added_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                book.id,
                book.title,
                json,
                Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
            ],
        )?;
        Ok(())
    }

    fn exists(conn: &Connection, id: &str) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM favorite_books WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Re-read the table and push it to observers. Called with the lock held
    /// so emissions follow mutation order.
    fn publish(&self, conn: &Connection) -> Result<()> {
        let books = Self::query_all(conn)?;
        tracing::debug!("Favorites changed: {} books", books.len());
        self.live.send_replace(books);
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for SqliteFavoritesStore {
    fn observe_all(&self) -> BoxStream<'static, Vec<Book>> {
        let rx = self.live.subscribe();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let books = rx.borrow_and_update().clone();
            Some((books, (rx, false)))
        })
        .boxed()
    }

    async fn all(&self) -> Result<Vec<Book>> {
        let conn = self.lock()?;
        Self::query_all(&conn)
    }

    async fn is_favorite(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        Self::exists(&conn, id)
    }

    async fn add(&self, book: &Book) -> Result<()> {
        let conn = self.lock()?;
        Self::insert(&conn, book)?;
        self.publish(&conn)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM favorite_books WHERE id = ?1", params![id])?;
        self.publish(&conn)
    }

    async fn toggle(&self, book: &Book) -> Result<bool> {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        let now_favorite = if Self::exists(&tx, &book.id)? {
            tx.execute("DELETE FROM favorite_books WHERE id = ?1", params![book.id])?;
            false
        } else {
            Self::insert(&tx, book)?;
            true
        };
        tx.commit()?;

        tracing::info!(
            "{} favorite {}",
            if now_favorite { "Added" } else { "Removed" },
            book.id
        );
        self.publish(&conn)?;
        Ok(now_favorite)
    }
}

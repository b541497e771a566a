use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{ClassifiedError, FolioError};
use crate::domain::Book;
use crate::session::view::ViewPublisher;
use crate::store::FavoritesStore;

/// Keeps the favorite overlay in the view consistent with the store.
///
/// Toggles are confirmed: the overlay changes only after the store reports
/// the new status.
#[derive(Clone)]
pub struct FavoriteTracker {
    store: Arc<dyn FavoritesStore + Send + Sync>,
    view: ViewPublisher,
    /// Per-id write counter; a status check only lands if no confirmed
    /// write for that id happened while it was reading.
    stamps: Arc<Mutex<HashMap<String, u64>>>,
}

/// Handle to the task following the store's live list. Dropping it stops the task.
pub struct FavoritesObserver {
    handle: JoinHandle<()>,
}

impl FavoritesObserver {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for FavoritesObserver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FavoriteTracker {
    pub fn new(store: Arc<dyn FavoritesStore + Send + Sync>, view: ViewPublisher) -> Self {
        Self {
            store,
            view,
            stamps: Arc::default(),
        }
    }

    /// Follow the store's live list for as long as the returned handle lives.
    pub fn observe_favorites(&self) -> FavoritesObserver {
        let mut live = self.store.observe_all();
        let tracker = self.clone();

        let handle = tokio::spawn(async move {
            while let Some(books) = live.next().await {
                tracker.apply_favorites(books);
            }
            debug!("Favorites stream closed");
        });

        FavoritesObserver { handle }
    }

    /// Merge one emission of the live list into the overlay.
    ///
    /// Listed ids become `true`; ids that were `true` and are no longer
    /// listed become `false`. Entries are never removed.
    pub fn apply_favorites(&self, books: Vec<Book>) {
        let mut touched = Vec::new();
        self.view.update(|state| {
            let listed: HashSet<&str> = books.iter().map(|b| b.id.as_str()).collect();
            let favorites = Arc::make_mut(&mut state.favorites);
            for (id, status) in favorites.iter_mut() {
                if *status && !listed.contains(id.as_str()) {
                    *status = false;
                    touched.push(id.clone());
                }
            }
            for book in &books {
                favorites.insert(book.id.clone(), true);
                touched.push(book.id.clone());
            }
            state.favorite_books = Arc::new(books);
            Some(())
        });
        for id in &touched {
            self.bump(id);
        }
    }

    pub async fn check_status(&self, id: &str) {
        let stamp = self.stamp(id);
        match self.store.is_favorite(id).await {
            Ok(status) if self.stamp(id) == stamp => self.set_status(id, status),
            Ok(_) => debug!("Dropped outdated favorite status for {}", id),
            Err(e) => self.record_failure("check favorite status", e),
        }
    }

    /// Flip the book's favorite status in the store and mirror the result.
    /// Returns the confirmed status, or `None` if the store failed.
    pub async fn toggle(&self, book: &Book) -> Option<bool> {
        match self.store.toggle(book).await {
            Ok(status) => {
                info!("Book {} is now {}", book.id, if status { "a favorite" } else { "not a favorite" });
                self.bump(&book.id);
                self.set_status(&book.id, status);
                Some(status)
            }
            Err(e) => {
                self.record_failure("toggle favorite", e);
                None
            }
        }
    }

    fn set_status(&self, id: &str, status: bool) {
        self.view.update(|state| {
            if state.favorites.get(id) == Some(&status) {
                return None;
            }
            Arc::make_mut(&mut state.favorites).insert(id.to_string(), status);
            Some(())
        });
    }

    fn stamps(&self) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
        match self.stamps.lock() {
            Ok(stamps) => stamps,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn stamp(&self, id: &str) -> u64 {
        self.stamps().get(id).copied().unwrap_or(0)
    }

    fn bump(&self, id: &str) {
        *self.stamps().entry(id.to_string()).or_insert(0) += 1;
    }

    fn record_failure(&self, action: &str, err: FolioError) {
        warn!("Failed to {}: {}", action, err);
        let error = ClassifiedError::from(&err);
        self.view.update(|state| {
            state.error = Some(error);
            Some(())
        });
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::app::ClassifiedError;
use crate::domain::{Book, Category, ResultStream};

/// Favorite status per book id.
pub type FavoriteStatusMap = HashMap<String, bool>;

/// Everything a view needs to render, as one immutable snapshot.
///
/// Snapshots are never edited after publication; each change produces a new
/// `Arc<ViewState>`, so observers can compare with [`Arc::ptr_eq`]. The
/// streams and lists sit behind their own `Arc`s so that a new snapshot
/// shares every part it did not change.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub trending: Arc<ResultStream<Book>>,
    pub search: Arc<ResultStream<Book>>,
    /// Text the search stream is keyed by; empty when no search is active.
    pub query: String,
    /// Shelf the trending stream is keyed by.
    pub category: Category,
    pub selected: Option<Book>,
    pub showing_favorites: bool,
    pub favorites: Arc<FavoriteStatusMap>,
    /// Latest list emitted by the favorites store.
    pub favorite_books: Arc<Vec<Book>>,
    /// Failures that belong to no stream: by-id lookups and favorites.
    pub error: Option<ClassifiedError>,
    pub(crate) selection_epoch: u64,
}

impl ViewState {
    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.get(id).copied().unwrap_or(false)
    }

    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }

    /// The list a grid would show right now.
    pub fn visible_books(&self) -> &[Book] {
        if self.showing_favorites {
            &self.favorite_books
        } else if self.is_searching() {
            &self.search.items
        } else {
            &self.trending.items
        }
    }

    /// Look a book up in the loaded trending items, then the search results.
    pub fn find_loaded(&self, id: &str) -> Option<&Book> {
        self.trending.find(id).or_else(|| self.search.find(id))
    }
}

/// Single-producer snapshot channel for [`ViewState`].
#[derive(Clone)]
pub struct ViewPublisher {
    tx: Arc<watch::Sender<Arc<ViewState>>>,
}

impl Default for ViewPublisher {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

impl ViewPublisher {
    pub fn new(initial: ViewState) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.tx.subscribe()
    }

    /// Copy the current snapshot, let `f` edit the copy, and publish it.
    ///
    /// When `f` returns `None` the copy is dropped and subscribers are not
    /// woken. Updates are serialized by the channel's lock; `f` must not block.
    pub fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> Option<R>) -> Option<R> {
        let mut outcome = None;
        self.tx.send_if_modified(|current| {
            let mut next = ViewState::clone(current);
            outcome = f(&mut next);
            if outcome.is_some() {
                *current = Arc::new(next);
                true
            } else {
                false
            }
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::book;

    #[test]
    fn test_update_replaces_snapshot() {
        let publisher = ViewPublisher::default();
        let before = publisher.snapshot();

        publisher.update(|state| {
            state.query = "dune".into();
            Some(())
        });

        let after = publisher.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.query, "");
        assert_eq!(after.query, "dune");
    }

    #[test]
    fn test_noop_update_keeps_snapshot() {
        let publisher = ViewPublisher::default();
        let before = publisher.snapshot();
        let rx = publisher.subscribe();

        let result: Option<()> = publisher.update(|state| {
            state.query = "discarded".into();
            None
        });

        assert!(result.is_none());
        assert!(Arc::ptr_eq(&before, &publisher.snapshot()));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let publisher = ViewPublisher::default();
        let mut rx = publisher.subscribe();

        publisher.update(|state| {
            state.showing_favorites = true;
            Some(())
        });

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().showing_favorites);
    }

    #[test]
    fn test_update_shares_untouched_parts() {
        let publisher = ViewPublisher::default();
        publisher.update(|state| {
            Arc::make_mut(&mut state.trending).items = vec![book("t1")];
            Some(())
        });
        let before = publisher.snapshot();

        publisher.update(|state| {
            Arc::make_mut(&mut state.search).items = vec![book("s1")];
            Some(())
        });

        let after = publisher.snapshot();
        assert!(Arc::ptr_eq(&before.trending, &after.trending));
        assert!(Arc::ptr_eq(&before.favorites, &after.favorites));
        assert!(!Arc::ptr_eq(&before.search, &after.search));
        assert!(before.search.items.is_empty());
    }

    #[test]
    fn test_visible_books_follows_mode() {
        let mut state = ViewState::default();
        Arc::make_mut(&mut state.trending).items = vec![book("t1")];
        Arc::make_mut(&mut state.search).items = vec![book("s1")];
        state.favorite_books = Arc::new(vec![book("f1")]);

        assert_eq!(state.visible_books()[0].id, "t1");
        state.query = "x".into();
        assert_eq!(state.visible_books()[0].id, "s1");
        state.showing_favorites = true;
        assert_eq!(state.visible_books()[0].id, "f1");
    }

    #[test]
    fn test_find_loaded_prefers_trending() {
        let mut state = ViewState::default();
        let mut trending = book("same");
        trending.title = "From trending".into();
        Arc::make_mut(&mut state.trending).items = vec![trending];
        Arc::make_mut(&mut state.search).items = vec![book("same"), book("only-search")];

        assert_eq!(state.find_loaded("same").unwrap().title, "From trending");
        assert!(state.find_loaded("only-search").is_some());
        assert!(state.find_loaded("missing").is_none());
    }
}

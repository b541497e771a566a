use tracing::{debug, warn};

use crate::app::ClassifiedError;
use crate::domain::{Book, DataState};
use crate::session::BrowseSession;

impl BrowseSession {
    /// Select `book` and refresh its favorite status.
    pub async fn select_item(&self, book: Book) {
        let id = book.id.clone();
        self.view.update(|state| {
            state.selection_epoch += 1;
            state.selected = Some(book);
            Some(())
        });
        self.favorites.check_status(&id).await;
    }

    pub fn clear_selection(&self) {
        self.view.update(|state| {
            state.selection_epoch += 1;
            state.selected = None;
            Some(())
        });
    }

    /// Select the book with `id`, preferring already loaded pages over the network.
    ///
    /// Looks in the trending items, then the search results, and only then
    /// asks the catalog. A failed lookup sets the view's error and leaves the
    /// selection alone; a lookup overtaken by another selection change is
    /// dropped and reported as `Idle`.
    pub async fn resolve_by_id(&self, id: &str) -> DataState<Book> {
        let snapshot = self.view.snapshot();

        // Already showing it
        if let Some(selected) = snapshot.selected.as_ref().filter(|b| b.id == id) {
            return DataState::Success(selected.clone());
        }
        if let Some(book) = snapshot.find_loaded(id).cloned() {
            debug!("Resolved {} from loaded pages", id);
            self.select_item(book.clone()).await;
            return DataState::Success(book);
        }

        // Any selection change from here on makes this lookup stale
        let epoch = self
            .view
            .update(|state| {
                state.selection_epoch += 1;
                state.error = None;
                Some(state.selection_epoch)
            })
            .unwrap_or_default();

        match self.catalog.fetch_by_id(id).await {
            Ok(book) => {
                let selected = book.clone();
                let applied = self.view.update(|state| {
                    if state.selection_epoch != epoch {
                        return None;
                    }
                    state.selection_epoch += 1;
                    state.selected = Some(selected);
                    Some(())
                });
                if applied.is_none() {
                    debug!("Discarded stale lookup of {}", id);
                    return DataState::Idle;
                }
                self.favorites.check_status(id).await;
                DataState::Success(book)
            }
            Err(e) => {
                warn!("Lookup of {} failed: {}", id, e);
                let error = ClassifiedError::from(&e);
                let reported = error.clone();
                let applied = self.view.update(|state| {
                    if state.selection_epoch != epoch {
                        return None;
                    }
                    state.error = Some(reported);
                    Some(())
                });
                if applied.is_none() {
                    return DataState::Idle;
                }
                DataState::Error(error)
            }
        }
    }
}

pub mod favorites;
pub mod query;
pub mod selection;
pub mod view;

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::info;

use crate::catalog::{CatalogClient, PAGE_SIZE};
use crate::domain::{Book, Category};
use crate::store::FavoritesStore;

pub use favorites::{FavoriteTracker, FavoritesObserver};
pub use query::QueryEngine;
pub use view::{FavoriteStatusMap, ViewPublisher, ViewState};

/// One browsing session: two paginated streams, a selection, and the
/// favorites overlay, all published through a single [`ViewState`] channel.
///
/// Intents never return errors. Failures land in the view, either on the
/// stream that failed or in [`ViewState::error`].
pub struct BrowseSession {
    view: ViewPublisher,
    engine: QueryEngine,
    favorites: FavoriteTracker,
    catalog: Arc<dyn CatalogClient + Send + Sync>,
    observer: Mutex<Option<FavoritesObserver>>,
}

impl BrowseSession {
    pub fn new(
        catalog: Arc<dyn CatalogClient + Send + Sync>,
        store: Arc<dyn FavoritesStore + Send + Sync>,
    ) -> Self {
        Self::with_page_size(catalog, store, PAGE_SIZE)
    }

    pub fn with_page_size(
        catalog: Arc<dyn CatalogClient + Send + Sync>,
        store: Arc<dyn FavoritesStore + Send + Sync>,
        page_size: usize,
    ) -> Self {
        let view = ViewPublisher::default();
        let engine = QueryEngine::with_page_size(catalog.clone(), view.clone(), page_size);
        let favorites = FavoriteTracker::new(store, view.clone());

        Self {
            view,
            engine,
            favorites,
            catalog,
            observer: Mutex::new(None),
        }
    }

    /// Begin following favorites and load the first page of `category`.
    pub async fn start(&self, category: Category) {
        self.observe_favorites();
        info!("Starting session on {}", category);
        self.engine.fetch_trending(category, true).await;
    }

    /// Start the favorites observer unless one is already running.
    pub fn observe_favorites(&self) {
        let mut slot = match self.observer.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.as_ref().is_some_and(|o| !o.is_finished()) {
            return;
        }
        *slot = Some(self.favorites.observe_favorites());
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.view.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.view.subscribe()
    }

    pub fn view(&self) -> &ViewPublisher {
        &self.view
    }

    pub async fn fetch_trending(&self, category: Category, reset: bool) {
        self.engine.fetch_trending(category, reset).await;
    }

    pub async fn fetch_search(&self, query: &str, reset: bool) {
        self.engine.fetch_search(query, reset).await;
    }

    pub async fn load_more_trending(&self) {
        self.engine.load_more_trending().await;
    }

    pub async fn load_more_search_results(&self) {
        self.engine.load_more_search_results().await;
    }

    pub async fn on_category_selected(&self, category: Category) {
        self.engine.on_category_selected(category).await;
    }

    pub async fn update_query(&self, text: &str) {
        self.engine.update_query(text).await;
    }

    pub fn clear_search(&self) {
        self.engine.clear_search();
    }

    pub async fn retry_trending(&self) {
        self.engine.retry_trending().await;
    }

    pub async fn retry_search(&self) {
        self.engine.retry_search().await;
    }

    pub async fn refresh(&self) {
        self.engine.refresh().await;
    }

    pub async fn check_status(&self, id: &str) {
        self.favorites.check_status(id).await;
    }

    /// Returns the confirmed status, or `None` when the store failed.
    pub async fn toggle_favorite(&self, book: &Book) -> Option<bool> {
        self.favorites.toggle(book).await
    }

    pub fn show_favorites(&self, showing: bool) {
        self.view.update(|state| {
            if state.showing_favorites == showing {
                return None;
            }
            state.showing_favorites = showing;
            Some(())
        });
    }

    pub fn dismiss_error(&self) {
        self.view.update(|state| state.error.take().map(|_| ()));
    }
}

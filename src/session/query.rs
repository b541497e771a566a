use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::ClassifiedError;
use crate::catalog::{CatalogClient, PageQuery, PAGE_SIZE};
use crate::domain::{Book, Category, PageTicket, ResultStream};
use crate::session::view::{ViewPublisher, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Trending,
    Search,
}

impl StreamKind {
    /// Mutable access to the stream, unsharing it from older snapshots.
    fn of(self, state: &mut ViewState) -> &mut ResultStream<Book> {
        match self {
            StreamKind::Trending => Arc::make_mut(&mut state.trending),
            StreamKind::Search => Arc::make_mut(&mut state.search),
        }
    }
}

/// Paginated fetch sequencing for the trending and search streams.
///
/// At most one page request per stream is in flight. A reset invalidates
/// whatever was in flight before it; late responses are dropped on arrival.
#[derive(Clone)]
pub struct QueryEngine {
    catalog: Arc<dyn CatalogClient + Send + Sync>,
    view: ViewPublisher,
    page_size: usize,
}

impl QueryEngine {
    pub fn new(catalog: Arc<dyn CatalogClient + Send + Sync>, view: ViewPublisher) -> Self {
        Self::with_page_size(catalog, view, PAGE_SIZE)
    }

    pub fn with_page_size(
        catalog: Arc<dyn CatalogClient + Send + Sync>,
        view: ViewPublisher,
        page_size: usize,
    ) -> Self {
        Self {
            catalog,
            view,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub async fn fetch_trending(&self, category: Category, reset: bool) {
        let ticket = self.view.update(|state| {
            if reset {
                state.category = category;
                Some(StreamKind::Trending.of(state).begin_reset())
            } else if state.category != category {
                None
            } else {
                StreamKind::Trending.of(state).begin_next_page()
            }
        });

        match ticket {
            Some(ticket) => {
                self.run_page(StreamKind::Trending, PageQuery::Trending(category), ticket)
                    .await
            }
            None => debug!("Skipping trending page for {}: nothing to load", category),
        }
    }

    /// Blank queries clear the search stream without contacting the catalog.
    pub async fn fetch_search(&self, query: &str, reset: bool) {
        let query = query.trim();
        if query.is_empty() {
            self.clear_search();
            return;
        }

        let ticket = self.view.update(|state| {
            if reset {
                state.query = query.to_string();
                Some(StreamKind::Search.of(state).begin_reset())
            } else if state.query != query {
                None
            } else {
                StreamKind::Search.of(state).begin_next_page()
            }
        });

        match ticket {
            Some(ticket) => {
                self.run_page(StreamKind::Search, PageQuery::Search(query.to_string()), ticket)
                    .await
            }
            None => debug!("Skipping search page for '{}': nothing to load", query),
        }
    }

    pub async fn load_more_trending(&self) {
        let category = self.view.snapshot().category;
        self.fetch_trending(category, false).await;
    }

    pub async fn load_more_search_results(&self) {
        let query = self.view.snapshot().query.clone();
        if query.is_empty() {
            return;
        }
        self.fetch_search(&query, false).await;
    }

    pub async fn on_category_selected(&self, category: Category) {
        self.fetch_trending(category, true).await;
    }

    pub async fn update_query(&self, text: &str) {
        self.fetch_search(text, true).await;
    }

    /// Reset the search stream to idle and drop any search in flight.
    pub fn clear_search(&self) {
        self.view.update(|state| {
            if state.query.is_empty() && state.search.state().is_idle() {
                return None;
            }
            state.query.clear();
            Arc::make_mut(&mut state.search).clear();
            Some(())
        });
    }

    pub async fn retry_trending(&self) {
        let category = self.view.snapshot().category;
        self.fetch_trending(category, true).await;
    }

    pub async fn retry_search(&self) {
        let query = self.view.snapshot().query.clone();
        self.fetch_search(&query, true).await;
    }

    /// Reload trending, and the active search if there is one.
    pub async fn refresh(&self) {
        let snapshot = self.view.snapshot();
        if snapshot.is_searching() {
            futures::join!(
                self.fetch_trending(snapshot.category, true),
                self.fetch_search(&snapshot.query, true)
            );
        } else {
            self.fetch_trending(snapshot.category, true).await;
        }
    }

    async fn run_page(&self, kind: StreamKind, query: PageQuery, ticket: PageTicket) {
        debug!("Requesting {} page {}", query, ticket.page_index);

        let result = self
            .catalog
            .fetch_page(&query, ticket.page_index, self.page_size)
            .await;

        // Stale tickets are rejected by the stream itself
        let page_size = self.page_size;
        let applied = match result {
            Ok(books) => {
                let count = books.len();
                let applied = self
                    .view
                    .update(|state| kind.of(state).apply_page(&ticket, books, page_size).then_some(()))
                    .is_some();
                if applied {
                    info!("Applied {} books to {} page {}", count, query, ticket.page_index);
                }
                applied
            }
            Err(e) => {
                let error = ClassifiedError::from(&e);
                warn!("Fetching {} page {} failed: {}", query, ticket.page_index, e);
                self.view
                    .update(|state| kind.of(state).apply_failure(&ticket, error).then_some(()))
                    .is_some()
            }
        };

        if !applied {
            debug!("Discarded stale response for {} page {}", query, ticket.page_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ErrorKind, FolioError};
    use crate::testing::{books, FakeCatalog};

    fn engine(catalog: &Arc<FakeCatalog>) -> (QueryEngine, ViewPublisher) {
        let view = ViewPublisher::default();
        let engine = QueryEngine::new(catalog.clone(), view.clone());
        (engine, view)
    }

    fn ids(items: &[Book]) -> Vec<String> {
        items.iter().map(|b| b.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_fiction_full_then_short_page() {
        let catalog = Arc::new(FakeCatalog::new());
        let fiction = PageQuery::Trending(Category::Fiction);
        catalog.push_page(&fiction, Ok(books("f", 0..20)));
        catalog.push_page(&fiction, Ok(books("f", 20..25)));
        let (engine, view) = engine(&catalog);

        engine.fetch_trending(Category::Fiction, true).await;
        let state = view.snapshot();
        assert!(state.trending.cursor.has_more);
        assert_eq!(state.trending.cursor.page_index, 1);
        assert_eq!(state.trending.items.len(), 20);

        engine.load_more_trending().await;
        let state = view.snapshot();
        assert!(!state.trending.cursor.has_more);
        assert_eq!(state.trending.items.len(), 25);
        assert_eq!(state.trending.cursor.page_index, 2);

        engine.load_more_trending().await;
        engine.load_more_trending().await;
        assert_eq!(catalog.page_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_pages_concatenate_in_request_order() {
        let catalog = Arc::new(FakeCatalog::new());
        let q = PageQuery::Search("rust".into());
        catalog.push_page(&q, Ok(books("a", 0..20)));
        catalog.push_page(&q, Ok(books("b", 0..20)));
        catalog.push_page(&q, Ok(books("c", 0..3)));
        let (engine, view) = engine(&catalog);

        engine.fetch_search("rust", true).await;
        engine.load_more_search_results().await;
        engine.load_more_search_results().await;

        let mut expected = ids(&books("a", 0..20));
        expected.extend(ids(&books("b", 0..20)));
        expected.extend(ids(&books("c", 0..3)));
        assert_eq!(ids(&view.snapshot().search.items), expected);

        let indices: Vec<_> = catalog.page_calls().iter().map(|(_, page)| *page).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_empty_page_ends_results() {
        let catalog = Arc::new(FakeCatalog::new());
        let (engine, view) = engine(&catalog);

        engine.fetch_trending(Category::Science, true).await;
        let state = view.snapshot();
        assert!(!state.trending.cursor.has_more);
        assert_eq!(state.trending.state().success().map(|s| s.len()), Some(0));
    }

    #[tokio::test]
    async fn test_load_more_is_noop_when_exhausted() {
        let catalog = Arc::new(FakeCatalog::new());
        let fiction = PageQuery::Trending(Category::Fiction);
        catalog.push_page(&fiction, Ok(books("f", 0..3)));
        let (engine, view) = engine(&catalog);

        engine.fetch_trending(Category::Fiction, true).await;
        let before = view.snapshot();
        engine.load_more_trending().await;

        assert!(Arc::ptr_eq(&before, &view.snapshot()));
        assert_eq!(catalog.page_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_load_more_is_noop_while_in_flight() {
        let catalog = Arc::new(FakeCatalog::new());
        let fiction = PageQuery::Trending(Category::Fiction);
        catalog.push_page(&fiction, Ok(books("f", 0..20)));
        catalog.push_page(&fiction, Ok(books("g", 0..20)));
        let (engine, view) = engine(&catalog);
        engine.fetch_trending(Category::Fiction, true).await;

        let gate = catalog.gate(&fiction);
        let pending = tokio::spawn({
            let engine = engine.clone();
            async move { engine.load_more_trending().await }
        });
        catalog.wait_for_page_calls(2).await;

        let before = view.snapshot();
        assert!(before.trending.cursor.is_fetching_next_page);
        engine.load_more_trending().await;
        assert!(Arc::ptr_eq(&before, &view.snapshot()));
        assert_eq!(catalog.page_calls().len(), 2);

        gate.notify_one();
        pending.await.unwrap();
        assert_eq!(view.snapshot().trending.items.len(), 40);
    }

    #[tokio::test]
    async fn test_category_switch_discards_stale_page() {
        let catalog = Arc::new(FakeCatalog::new());
        let fiction = PageQuery::Trending(Category::Fiction);
        let mystery = PageQuery::Trending(Category::Mystery);
        catalog.push_page(&fiction, Ok(books("fiction", 0..20)));
        catalog.push_page(&mystery, Ok(books("mystery", 0..20)));
        let (engine, view) = engine(&catalog);

        let gate = catalog.gate(&fiction);
        let slow = tokio::spawn({
            let engine = engine.clone();
            async move { engine.fetch_trending(Category::Fiction, true).await }
        });
        catalog.wait_for_page_calls(1).await;

        engine.fetch_trending(Category::Mystery, true).await;
        gate.notify_one();
        slow.await.unwrap();

        let state = view.snapshot();
        assert_eq!(state.category, Category::Mystery);
        assert_eq!(ids(&state.trending.items), ids(&books("mystery", 0..20)));
        assert!(!state.trending.cursor.is_fetching());
        assert_eq!(state.trending.cursor.page_index, 1);
    }

    #[tokio::test]
    async fn test_blank_search_is_idle_without_call() {
        let catalog = Arc::new(FakeCatalog::new());
        let (engine, view) = engine(&catalog);

        engine.fetch_search("   ", true).await;

        let state = view.snapshot();
        assert!(state.search.state().is_idle());
        assert!(state.search.items.is_empty());
        assert_eq!(state.query, "");
        assert!(catalog.page_calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_search_invalidates_in_flight_search() {
        let catalog = Arc::new(FakeCatalog::new());
        let q = PageQuery::Search("dune".into());
        catalog.push_page(&q, Ok(books("dune", 0..5)));
        let (engine, view) = engine(&catalog);

        let gate = catalog.gate(&q);
        let slow = tokio::spawn({
            let engine = engine.clone();
            async move { engine.fetch_search("dune", true).await }
        });
        catalog.wait_for_page_calls(1).await;

        engine.clear_search();
        gate.notify_one();
        slow.await.unwrap();

        let state = view.snapshot();
        assert!(state.search.state().is_idle());
        assert!(state.search.items.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_pages() {
        let catalog = Arc::new(FakeCatalog::new());
        let fiction = PageQuery::Trending(Category::Fiction);
        catalog.push_page(&fiction, Ok(books("f", 0..20)));
        catalog.push_page(
            &fiction,
            Err(FolioError::Api {
                status: 503,
                body: "unavailable".into(),
            }),
        );
        catalog.push_page(&fiction, Ok(books("g", 0..2)));
        let (engine, view) = engine(&catalog);

        engine.fetch_trending(Category::Fiction, true).await;
        engine.load_more_trending().await;

        let state = view.snapshot();
        assert_eq!(state.trending.items.len(), 20);
        assert_eq!(
            state.trending.last_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::ServerFailure)
        );
        assert!(!state.trending.cursor.is_fetching());
        assert_eq!(state.trending.cursor.page_index, 1);

        // Retrying the failed page asks for the same index again.
        engine.load_more_trending().await;
        let state = view.snapshot();
        assert_eq!(state.trending.items.len(), 22);
        assert!(state.trending.last_error.is_none());
        let indices: Vec<_> = catalog.page_calls().iter().map(|(_, page)| *page).collect();
        assert_eq!(indices, vec![0, 1, 1]);
    }

    #[tokio::test]
    async fn test_first_page_timeout_is_error_state() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.push_page(&PageQuery::Search("x".into()), Err(FolioError::Timeout));
        let (engine, view) = engine(&catalog);

        engine.update_query("x").await;

        let state = view.snapshot();
        let error = state.search.state().error().cloned().unwrap();
        assert_eq!(error.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_load_more_after_first_page_failure_is_noop() {
        let catalog = Arc::new(FakeCatalog::new());
        let fiction = PageQuery::Trending(Category::Fiction);
        catalog.push_page(&fiction, Err(FolioError::Timeout));
        catalog.push_page(&fiction, Ok(books("f", 0..20)));
        let (engine, view) = engine(&catalog);

        engine.fetch_trending(Category::Fiction, true).await;
        let before = view.snapshot();
        engine.load_more_trending().await;

        assert!(Arc::ptr_eq(&before, &view.snapshot()));
        assert!(before.trending.state().error().is_some());
        assert_eq!(catalog.page_calls().len(), 1);

        // Only a reset recovers from a failed first page.
        engine.retry_trending().await;
        assert_eq!(view.snapshot().trending.items.len(), 20);
    }

    #[tokio::test]
    async fn test_retry_trending_resets_stream() {
        let catalog = Arc::new(FakeCatalog::new());
        let business = PageQuery::Trending(Category::Business);
        catalog.push_page(&business, Err(FolioError::Timeout));
        catalog.push_page(&business, Ok(books("b", 0..4)));
        let (engine, view) = engine(&catalog);

        engine.on_category_selected(Category::Business).await;
        assert!(view.snapshot().trending.state().error().is_some());

        engine.retry_trending().await;
        let state = view.snapshot();
        assert_eq!(state.trending.items.len(), 4);
        assert!(state.trending.last_error.is_none());
    }

    #[tokio::test]
    async fn test_load_more_with_other_key_is_noop() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.push_page(&PageQuery::Trending(Category::Fiction), Ok(books("f", 0..20)));
        let (engine, _view) = engine(&catalog);

        engine.fetch_trending(Category::Fiction, true).await;
        engine.fetch_trending(Category::Romance, false).await;
        engine.fetch_search("unrelated", false).await;

        assert_eq!(catalog.page_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_reloads_both_streams() {
        let catalog = Arc::new(FakeCatalog::new());
        let fiction = PageQuery::Trending(Category::Fiction);
        let q = PageQuery::Search("rust".into());
        catalog.push_page(&fiction, Ok(books("f", 0..2)));
        catalog.push_page(&q, Ok(books("r", 0..2)));
        catalog.push_page(&fiction, Ok(books("f2", 0..1)));
        catalog.push_page(&q, Ok(books("r2", 0..1)));
        let (engine, view) = engine(&catalog);

        engine.fetch_trending(Category::Fiction, true).await;
        engine.update_query("rust").await;
        engine.refresh().await;

        let state = view.snapshot();
        assert_eq!(ids(&state.trending.items), ids(&books("f2", 0..1)));
        assert_eq!(ids(&state.search.items), ids(&books("r2", 0..1)));
    }
}

//! Fakes and fixtures shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::Notify;

use crate::app::{FolioError, Result};
use crate::catalog::{CatalogClient, PageQuery};
use crate::domain::Book;
use crate::session::view::{ViewPublisher, ViewState};
use crate::store::FavoritesStore;

pub fn book(id: &str) -> Book {
    Book::new(id, format!("Title {id}"))
}

pub fn books(prefix: &str, range: Range<usize>) -> Vec<Book> {
    range.map(|i| book(&format!("{prefix}-{i}"))).collect()
}

/// Wait until a published snapshot satisfies `pred`.
pub async fn wait_for(view: &ViewPublisher, pred: impl Fn(&ViewState) -> bool) -> Arc<ViewState> {
    let mut rx = view.subscribe();
    let wait = async {
        loop {
            let current = rx.borrow_and_update().clone();
            if pred(&current) {
                return current;
            }
            rx.changed().await.expect("view publisher dropped");
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for view state")
}

#[derive(Default)]
struct Scripted {
    pages: HashMap<PageQuery, VecDeque<Result<Vec<Book>>>>,
    page_calls: Vec<(PageQuery, usize)>,
    page_gates: HashMap<PageQuery, Arc<Notify>>,
    by_id: HashMap<String, VecDeque<Result<Book>>>,
    by_id_calls: Vec<String>,
    by_id_gates: HashMap<String, Arc<Notify>>,
}

/// Catalog that replays queued responses and records every call.
///
/// A gate holds back the next call for its key until `notify_one` is called.
#[derive(Default)]
pub struct FakeCatalog {
    inner: Mutex<Scripted>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, query: &PageQuery, response: Result<Vec<Book>>) {
        self.inner
            .lock()
            .unwrap()
            .pages
            .entry(query.clone())
            .or_default()
            .push_back(response);
    }

    pub fn push_book(&self, id: &str, response: Result<Book>) {
        self.inner
            .lock()
            .unwrap()
            .by_id
            .entry(id.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn gate(&self, query: &PageQuery) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.inner
            .lock()
            .unwrap()
            .page_gates
            .insert(query.clone(), notify.clone());
        notify
    }

    pub fn gate_by_id(&self, id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.inner
            .lock()
            .unwrap()
            .by_id_gates
            .insert(id.to_string(), notify.clone());
        notify
    }

    pub fn page_calls(&self) -> Vec<(PageQuery, usize)> {
        self.inner.lock().unwrap().page_calls.clone()
    }

    pub fn by_id_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().by_id_calls.clone()
    }

    pub async fn wait_for_page_calls(&self, n: usize) {
        while self.page_calls().len() < n {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_by_id_calls(&self, n: usize) {
        while self.by_id_calls().len() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn fetch_page(
        &self,
        query: &PageQuery,
        page_index: usize,
        _page_size: usize,
    ) -> Result<Vec<Book>> {
        let (response, gate) = {
            let mut inner = self.inner.lock().unwrap();
            inner.page_calls.push((query.clone(), page_index));
            let response = inner
                .pages
                .get_mut(query)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Ok(Vec::new()));
            (response, inner.page_gates.remove(query))
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        response
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Book> {
        let (response, gate) = {
            let mut inner = self.inner.lock().unwrap();
            inner.by_id_calls.push(id.to_string());
            let response = inner
                .by_id
                .get_mut(id)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Err(FolioError::BookNotFound(id.to_string())));
            (response, inner.by_id_gates.remove(id))
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        response
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

fn unavailable() -> FolioError {
    FolioError::Other("favorites store unavailable".into())
}

#[async_trait]
impl FavoritesStore for FailingStore {
    fn observe_all(&self) -> BoxStream<'static, Vec<Book>> {
        stream::empty().boxed()
    }

    async fn all(&self) -> Result<Vec<Book>> {
        Err(unavailable())
    }

    async fn is_favorite(&self, _id: &str) -> Result<bool> {
        Err(unavailable())
    }

    async fn add(&self, _book: &Book) -> Result<()> {
        Err(unavailable())
    }

    async fn remove(&self, _id: &str) -> Result<()> {
        Err(unavailable())
    }

    async fn toggle(&self, _book: &Book) -> Result<bool> {
        Err(unavailable())
    }
}

use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;

use crate::app::{FolioError, Result};
use crate::catalog::{CatalogClient, PageQuery};
use crate::config::CatalogConfig;
use crate::domain::Book;
use crate::normalizer::Normalizer;

/// Fields requested for listings; keeps responses small.
const LIST_FIELDS: &str = "kind,totalItems,items(id,volumeInfo,saleInfo,accessInfo)";

/// [`CatalogClient`] backed by the Google Books volumes API.
pub struct GoogleBooksClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    language: String,
    normalizer: Normalizer,
}

impl GoogleBooksClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key().map(String::from),
            language: config.language.clone(),
            normalizer: Normalizer::new(),
        })
    }

    /// Build the `volumes` listing URL for one page.
    pub fn page_url(&self, query: &PageQuery, page_index: usize, page_size: usize) -> Result<Url> {
        let mut url = self.base_url.join("volumes")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", query.query_text())
                .append_pair("maxResults", &page_size.to_string())
                .append_pair("startIndex", &(page_index * page_size).to_string())
                .append_pair("fields", LIST_FIELDS);

            if let PageQuery::Trending(_) = query {
                pairs
                    .append_pair("orderBy", "relevance")
                    .append_pair("filter", "ebooks")
                    .append_pair("langRestrict", &self.language)
                    .append_pair("printType", "books");
            }

            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }
        Ok(url)
    }

    pub fn volume_url(&self, id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FolioError::Config(format!("Unusable catalog base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("volumes")
            .push(id);

        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", redact_key(&url));

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(FolioError::Timeout),
            Err(e) => return Err(e.into()),
        };

        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Catalog returned {}: {}", status.as_u16(), body);
        return Err(FolioError::Api {
            status: status.as_u16(),
            body,
        });
    }

    match response.bytes().await {
        Ok(bytes) => Ok(bytes.to_vec()),
        Err(e) if e.is_timeout() => Err(FolioError::Timeout),
        Err(e) => Err(e.into()),
    }
}

fn redact_key(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

#[async_trait]
impl CatalogClient for GoogleBooksClient {
    async fn fetch_page(
        &self,
        query: &PageQuery,
        page_index: usize,
        page_size: usize,
    ) -> Result<Vec<Book>> {
        let url = self.page_url(query, page_index, page_size)?;
        let body = self.get(url).await?;
        let books = self.normalizer.normalize_page(&body)?;
        tracing::info!("Fetched {} books for {} page {}", books.len(), query, page_index);
        Ok(books)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Book> {
        let url = self.volume_url(id)?;
        let body = match self.get(url).await {
            Err(FolioError::Api { status: 404, .. }) => {
                return Err(FolioError::BookNotFound(id.to_string()))
            }
            other => other?,
        };
        self.normalizer.normalize_volume(&body)
    }
}

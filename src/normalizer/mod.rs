use html_escape::decode_html_entities;
use serde::Deserialize;

use crate::app::Result;
use crate::domain::{Book, SaleLink};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    pub volume_info: VolumeInfo,
    #[serde(default)]
    pub sale_info: Option<SaleInfo>,
    #[serde(default)]
    pub access_info: Option<AccessInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeInfo {
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub image_links: Option<ImageLinks>,
    pub language: Option<String>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u32>,
    pub industry_identifiers: Option<Vec<IndustryIdentifier>>,
    pub maturity_rating: Option<String>,
    pub preview_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleInfo {
    pub buy_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessInfo {
    pub web_reader_link: Option<String>,
}

/// Turns catalog volume JSON into [`Book`] values.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode a `volumes` listing. A response without `items` is an empty page.
    pub fn normalize_page(&self, body: &[u8]) -> Result<Vec<Book>> {
        let response: VolumesResponse = serde_json::from_slice(body)?;
        tracing::debug!(
            "Decoded volumes page: {} items of {} total",
            response.items.as_ref().map_or(0, Vec::len),
            response.total_items
        );
        Ok(response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|volume| self.to_book(volume))
            .collect())
    }

    pub fn normalize_volume(&self, body: &[u8]) -> Result<Book> {
        let volume: Volume = serde_json::from_slice(body)?;
        Ok(self.to_book(volume))
    }

    pub fn to_book(&self, volume: Volume) -> Book {
        let info = volume.volume_info;

        let cover_url = info
            .image_links
            .and_then(|links| links.thumbnail.or(links.small_thumbnail))
            .map(|url| force_https(&url))
            .unwrap_or_default();

        let isbn = info
            .industry_identifiers
            .as_deref()
            .map(pick_isbn)
            .unwrap_or_default();

        let mut sale_links = Vec::new();
        if let Some(url) = volume.sale_info.and_then(|s| s.buy_link) {
            sale_links.push(SaleLink {
                kind: "buy".into(),
                url,
            });
        }
        if let Some(url) = volume.access_info.and_then(|a| a.web_reader_link) {
            if !url.is_empty() {
                sale_links.push(SaleLink {
                    kind: "read".into(),
                    url,
                });
            }
        }

        Book {
            id: volume.id,
            title: decode_html_entities(&info.title).to_string(),
            subtitle: info.subtitle.map(|s| decode_html_entities(&s).to_string()),
            authors: info.authors.unwrap_or_default(),
            description: info
                .description
                .map(|d| decode_html_entities(&d).to_string())
                .unwrap_or_default(),
            cover_url,
            publisher: info.publisher.unwrap_or_default(),
            published_date: info.published_date.unwrap_or_default(),
            page_count: info.page_count,
            categories: info.categories.unwrap_or_default(),
            average_rating: info.average_rating,
            ratings_count: info.ratings_count.unwrap_or(0),
            isbn,
            language: info.language.unwrap_or_default(),
            maturity_rating: info.maturity_rating,
            preview_link: info.preview_link.map(|url| force_https(&url)),
            sale_links,
        }
    }
}

fn force_https(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{}", rest),
        None => url.to_string(),
    }
}

fn pick_isbn(ids: &[IndustryIdentifier]) -> String {
    ["ISBN_13", "ISBN_10"]
        .iter()
        .find_map(|wanted| ids.iter().find(|id| id.kind == *wanted))
        .map(|id| id.identifier.clone())
        .unwrap_or_default()
}

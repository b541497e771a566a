use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLink {
    /// `buy` or `read`
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub ratings_count: u32,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub maturity_rating: Option<String>,
    #[serde(default)]
    pub preview_link: Option<String>,
    #[serde(default)]
    pub sale_links: Vec<SaleLink>,
}

impl Book {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            authors: Vec::new(),
            description: String::new(),
            cover_url: String::new(),
            publisher: String::new(),
            published_date: String::new(),
            page_count: None,
            categories: Vec::new(),
            average_rating: None,
            ratings_count: 0,
            isbn: String::new(),
            language: String::new(),
            maturity_rating: None,
            preview_link: None,
            sale_links: Vec::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Authors joined for a single line, or "Unknown author".
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            "Unknown author".to_string()
        } else {
            self.authors.join(", ")
        }
    }

    /// Best link to hand to a browser: the preview, else the first sale link.
    pub fn best_link(&self) -> Option<&str> {
        self.preview_link
            .as_deref()
            .or_else(|| self.sale_links.first().map(|l| l.url.as_str()))
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{FolioError, Result};
use crate::catalog::{CatalogClient, GoogleBooksClient};
use crate::config::Config;
use crate::session::BrowseSession;
use crate::store::SqliteFavoritesStore;

pub struct AppContext {
    pub config: Config,
    pub catalog: Arc<dyn CatalogClient + Send + Sync>,
    pub store: Arc<SqliteFavoritesStore>,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteFavoritesStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteFavoritesStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteFavoritesStore>) -> Result<Self> {
        let catalog: Arc<dyn CatalogClient + Send + Sync> =
            Arc::new(GoogleBooksClient::new(&config.catalog)?);

        Ok(Self {
            config,
            catalog,
            store,
        })
    }

    /// A fresh session over this context's catalog and store.
    pub fn session(&self) -> BrowseSession {
        BrowseSession::with_page_size(
            self.catalog.clone(),
            self.store.clone(),
            self.config.catalog.page_size,
        )
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FolioError::Config("Could not find data directory".into()))?;
        let folio_dir = data_dir.join("folio");
        std::fs::create_dir_all(&folio_dir)?;
        Ok(folio_dir.join("folio.db"))
    }
}

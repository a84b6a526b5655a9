//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{ApiConfig, MediaUrls};
use crate::db::Store;
use crate::services::media::MediaStorage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, configuration and media storage.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    media: MediaStorage,
    media_urls: MediaUrls,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Storage adapter (`PgStore` or `MemoryStore`)
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn Store>) -> Self {
        let media = MediaStorage::new(config.media_root.clone());
        let media_urls = config.media_urls();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                media,
                media_urls,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the storage adapter.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the media storage.
    #[must_use]
    pub fn media(&self) -> &MediaStorage {
        &self.inner.media
    }

    /// Get the media URL builder.
    #[must_use]
    pub fn media_urls(&self) -> &MediaUrls {
        &self.inner.media_urls
    }
}

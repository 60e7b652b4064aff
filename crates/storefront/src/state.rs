//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::middleware::security_headers::content_security_policy;
use crate::services::CatalogService;
use crate::storage::{StorageClient, StorageError};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
    #[error("content: {0}")]
    Content(#[from] ContentError),
    #[error("invalid content security policy: {0}")]
    Csp(#[from] axum::http::header::InvalidHeaderValue),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogService,
    storage: StorageClient,
    content: ContentStore,
    csp: HeaderValue,
}

impl AppState {
    /// Create the application state, loading content pages from
    /// `config.content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage client cannot be built or the content
    /// directory cannot be read.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let catalog = CatalogService::new(pool.clone(), config.catalog_cache_ttl);
        let storage = StorageClient::new(&config.supabase)?;
        let content = ContentStore::load(&config.content_dir)?;
        let csp = HeaderValue::from_str(&content_security_policy(
            &config.supabase.url.origin().ascii_serialization(),
        ))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                storage,
                content,
                csp,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.inner.storage
    }

    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    #[must_use]
    pub fn content_security_policy(&self) -> &HeaderValue {
        &self.inner.csp
    }
}

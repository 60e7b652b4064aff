//! Database operations for the storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `products`, `lenses` - Catalogue (written by the catalog import / product admin)
//! - `categories`, `special_product_categories`, `product_special_categories`
//! - `"user"` - Customers, with `cart_items` and `favorites` as JSON columns
//! - `orders` - Written by checkout, read-only here
//! - `slide`, `category_banners`, `shape_banners` - Homepage media
//! - `admin` - Admin console accounts
//! - `tower_sessions.session` - Session store
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p eyeric-cli -- migrate
//! ```
//!
//! Queries are runtime-checked (`sqlx::query_as` into `FromRow` row types),
//! so building the crate does not need a live database.

pub mod admins;
pub mod categories;
pub mod lenses;
pub mod media;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admins::AdminRepository;
pub use categories::CategoryRepository;
pub use lenses::LensRepository;
pub use media::MediaRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or a lost optimistic-concurrency race.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique_violation(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Decode a JSON column into a domain type, reporting bad rows as corruption.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column}: {e}")))
}

/// Encode a domain value for a JSON column.
pub(crate) fn encode_json<T: serde::Serialize>(
    value: &T,
    column: &str,
) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("cannot encode {column}: {e}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

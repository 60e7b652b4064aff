//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration/login and admin login (argon2)
//! - `catalog` - Cached product and lens catalogue plus the listing engine
//! - `cart` - Cart persistence: session for guests, `"user".cart_items` otherwise
//! - `favorites` - Favorites persistence, with the merge performed on login

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favorites;

use thiserror::Error;

use crate::db::RepositoryError;

pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use favorites::FavoritesService;

/// Errors from services that persist to the session or the database.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

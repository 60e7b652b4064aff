//! User repository for database operations.
//!
//! Besides the account itself, the `"user"` row carries the customer's cart
//! and favorites as JSON arrays. Both are always written whole.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use eyeric_core::cart::{Cart, CartItem};
use eyeric_core::catalog::Product;
use eyeric_core::favorites::Favorites;
use eyeric_core::{Email, UserId};

use super::{RepositoryError, decode_json, encode_json};
use crate::models::User;

/// Raw `"user"` row without the JSON columns.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A cart together with the version it was read at.
#[derive(Debug, Clone, Default)]
pub struct VersionedCart {
    pub cart: Cart,
    pub version: i32,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO "user" (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(email.as_str())
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email"))?;

        User::try_from(row)
    }

    /// Get a user together with their password hash, for login.
    ///
    /// Users without a password (created elsewhere) are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: Option<String>,
        }

        let row: Option<Row> = sqlx::query_as(
            r#"
            SELECT id, email, name, created_at, updated_at, password_hash
            FROM "user"
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(Row {
                user,
                password_hash: Some(hash),
            }) => Ok(Some((User::try_from(user)?, hash))),
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Load the stored cart and its version.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::DataCorruption` if the JSON does not decode.
    #[instrument(skip(self))]
    pub async fn load_cart(&self, id: UserId) -> Result<VersionedCart, RepositoryError> {
        let row: Option<(serde_json::Value, i32)> =
            sqlx::query_as(r#"SELECT cart_items, cart_version FROM "user" WHERE id = $1"#)
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        let (items, version) = row.ok_or(RepositoryError::NotFound)?;
        let items: Vec<CartItem> = decode_json(items, "cart_items")?;

        Ok(VersionedCart {
            cart: Cart::from_items(items),
            version,
        })
    }

    /// Overwrite the cart if it is still at `expected_version`.
    ///
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another request saved first.
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, cart), fields(lines = cart.items().len()))]
    pub async fn save_cart(
        &self,
        id: UserId,
        cart: &Cart,
        expected_version: i32,
    ) -> Result<i32, RepositoryError> {
        let items = encode_json(cart, "cart_items")?;

        let new_version: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE "user"
            SET cart_items = $2, cart_version = cart_version + 1, updated_at = NOW()
            WHERE id = $1 AND cart_version = $3
            RETURNING cart_version
            "#,
        )
        .bind(id)
        .bind(items)
        .bind(expected_version)
        .fetch_optional(self.pool)
        .await?;

        new_version
            .map(|(version,)| version)
            .ok_or_else(|| RepositoryError::Conflict("cart changed concurrently".to_string()))
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::DataCorruption` if the JSON does not decode.
    #[instrument(skip(self))]
    pub async fn load_favorites(&self, id: UserId) -> Result<Favorites, RepositoryError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r#"SELECT favorites FROM "user" WHERE id = $1"#)
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        let (favorites,) = row.ok_or(RepositoryError::NotFound)?;
        let products: Vec<Product> = decode_json(favorites, "favorites")?;
        Ok(Favorites::from(products))
    }

    /// Overwrite the favorites array.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, favorites), fields(count = favorites.len()))]
    pub async fn save_favorites(
        &self,
        id: UserId,
        favorites: &Favorites,
    ) -> Result<(), RepositoryError> {
        let favorites = encode_json(favorites, "favorites")?;

        let result = sqlx::query(
            r#"UPDATE "user" SET favorites = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(id)
        .bind(favorites)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

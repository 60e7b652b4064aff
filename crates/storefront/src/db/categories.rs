//! Merchandising categories shown on the homepage.

use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use eyeric_core::{CategoryId, SpecialCategoryId};

use super::RepositoryError;

/// A top-level category tile (e.g. "Eyeglasses").
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub display_order: i32,
}

/// A curated collection such as "Bestsellers", with its own product order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SpecialCategory {
    pub id: SpecialCategoryId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub display_order: i32,
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as(
            r"
            SELECT id, name, slug, image_url, display_order
            FROM categories
            WHERE is_active
            ORDER BY display_order, id
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Active special categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_special_categories(&self) -> Result<Vec<SpecialCategory>, RepositoryError> {
        let rows = sqlx::query_as(
            r"
            SELECT id, name, description, image_url, display_order
            FROM special_product_categories
            WHERE is_active
            ORDER BY display_order, id
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_special_category(
        &self,
        id: SpecialCategoryId,
    ) -> Result<Option<SpecialCategory>, RepositoryError> {
        let row = sqlx::query_as(
            r"
            SELECT id, name, description, image_url, display_order
            FROM special_product_categories
            WHERE id = $1 AND is_active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}

//! Lens repository.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use eyeric_core::lens::Lens;
use eyeric_core::{LensCategoryId, LensId, LensKind};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct LensRow {
    id: LensId,
    title: String,
    description: String,
    features: Vec<String>,
    category: LensKind,
    price: Decimal,
    lens_category_id: LensCategoryId,
}

impl From<LensRow> for Lens {
    fn from(row: LensRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            features: row.features,
            kind: row.category,
            price: row.price,
            lens_category_id: row.lens_category_id,
        }
    }
}

/// Repository for lens database operations.
pub struct LensRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LensRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every lens, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Lens>, RepositoryError> {
        let rows: Vec<LensRow> = sqlx::query_as(
            r"
            SELECT id, title, description, features, category, price, lens_category_id
            FROM lenses
            ORDER BY price, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Lens::from).collect())
    }

    /// Insert a lens and return its new id.
    ///
    /// Used by the catalogue import; the id on `lens` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, lens), fields(title = %lens.title))]
    pub async fn insert(&self, lens: &Lens) -> Result<LensId, RepositoryError> {
        let (id,): (LensId,) = sqlx::query_as(
            r"
            INSERT INTO lenses (title, description, features, category, price, lens_category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&lens.title)
        .bind(&lens.description)
        .bind(&lens.features)
        .bind(lens.kind)
        .bind(lens.price)
        .bind(lens.lens_category_id)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}

//! Homepage media: hero slides and category/shape banners.
//!
//! The three tables share one layout. Banners additionally name the page they
//! belong to (`category` for gender pages, `shape` for shape pages), which is
//! surfaced as [`MediaItem::target`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use eyeric_core::MediaId;

use super::RepositoryError;
use crate::storage::Bucket;

/// Which media table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Slides,
    CategoryBanners,
    ShapeBanners,
}

impl MediaKind {
    pub const ALL: [Self; 3] = [Self::Slides, Self::CategoryBanners, Self::ShapeBanners];

    /// URL segment used by the admin console.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Slides => "slides",
            Self::CategoryBanners => "category-banners",
            Self::ShapeBanners => "shape-banners",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Slides => "Slides",
            Self::CategoryBanners => "Category banners",
            Self::ShapeBanners => "Shape banners",
        }
    }

    /// Bucket holding this kind's image files.
    #[must_use]
    pub const fn bucket(self) -> Bucket {
        match self {
            Self::Slides => Bucket::Slides,
            Self::CategoryBanners => Bucket::CategoryBanners,
            Self::ShapeBanners => Bucket::ShapeBanners,
        }
    }

    /// Whether rows of this kind must name a target page.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        self.target_column().is_some()
    }

    const fn table(self) -> &'static str {
        match self {
            Self::Slides => "slide",
            Self::CategoryBanners => "category_banners",
            Self::ShapeBanners => "shape_banners",
        }
    }

    const fn target_column(self) -> Option<&'static str> {
        match self {
            Self::Slides => None,
            Self::CategoryBanners => Some("category"),
            Self::ShapeBanners => Some("shape"),
        }
    }

    fn select_columns(self) -> String {
        let target = self
            .target_column()
            .map_or_else(|| "NULL::TEXT".to_string(), str::to_string);
        format!(
            "id, {target} AS target, image_url, storage_path, title, link_url, \
             display_order, is_active, created_at"
        )
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// A slide or banner row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MediaItem {
    pub id: MediaId,
    /// Gender category or shape for banners; `None` for slides.
    pub target: Option<String>,
    pub image_url: String,
    pub storage_path: String,
    pub title: Option<String>,
    pub link_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new slide or banner, after its image has been uploaded.
#[derive(Debug, Clone, Default)]
pub struct NewMedia {
    pub target: Option<String>,
    pub image_url: String,
    pub storage_path: String,
    pub title: Option<String>,
    pub link_url: Option<String>,
}

/// Repository for slide and banner operations.
pub struct MediaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MediaRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every row of `kind`, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn list(&self, kind: MediaKind) -> Result<Vec<MediaItem>, RepositoryError> {
        let rows = sqlx::query_as(&format!(
            "SELECT {} FROM {} ORDER BY display_order, id",
            kind.select_columns(),
            kind.table()
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Active rows of `kind`, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn list_active(&self, kind: MediaKind) -> Result<Vec<MediaItem>, RepositoryError> {
        let rows = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE is_active ORDER BY display_order, id",
            kind.select_columns(),
            kind.table()
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a row at the end of the display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a banner has no target page.
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, media), fields(kind = %kind))]
    pub async fn insert(
        &self,
        kind: MediaKind,
        media: &NewMedia,
    ) -> Result<MediaItem, RepositoryError> {
        let table = kind.table();
        let returning = kind.select_columns();
        let next_order = format!("(SELECT COALESCE(MAX(display_order), 0) + 1 FROM {table})");

        let query = match kind.target_column() {
            None => format!(
                "INSERT INTO {table} (image_url, storage_path, title, link_url, display_order) \
                 VALUES ($1, $2, $3, $4, {next_order}) RETURNING {returning}"
            ),
            Some(column) => {
                if media.target.as_deref().is_none_or(|t| t.trim().is_empty()) {
                    return Err(RepositoryError::Conflict(format!("{column} is required")));
                }
                format!(
                    "INSERT INTO {table} (image_url, storage_path, title, link_url, display_order, {column}) \
                     VALUES ($1, $2, $3, $4, {next_order}, $5) RETURNING {returning}"
                )
            }
        };

        let mut insert = sqlx::query_as(&query)
            .bind(&media.image_url)
            .bind(&media.storage_path)
            .bind(&media.title)
            .bind(&media.link_url);
        if kind.needs_target() {
            insert = insert.bind(&media.target);
        }

        let row: MediaItem = insert.fetch_one(self.pool).await?;
        Ok(row)
    }

    /// Delete a row, returning the storage path of its image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn delete(
        &self,
        kind: MediaKind,
        id: MediaId,
    ) -> Result<Option<String>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as(&format!(
            "DELETE FROM {} WHERE id = $1 RETURNING storage_path",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(path,)| path))
    }

    /// Set whether a row is shown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn set_active(
        &self,
        kind: MediaKind,
        id: MediaId,
        active: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET is_active = $2 WHERE id = $1",
            kind.table()
        ))
        .bind(id)
        .bind(active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip a row's visibility, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn toggle_active(&self, kind: MediaKind, id: MediaId) -> Result<bool, RepositoryError> {
        let row: Option<(bool,)> = sqlx::query_as(&format!(
            "UPDATE {} SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(active,)| active).ok_or(RepositoryError::NotFound)
    }

    /// Renumber rows so they display in the order of `ids` (1-based).
    ///
    /// Ids not listed keep their current position value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any update fails; no update is
    /// applied in that case.
    #[instrument(skip(self, ids), fields(kind = %kind, count = ids.len()))]
    pub async fn reorder(&self, kind: MediaKind, ids: &[MediaId]) -> Result<(), RepositoryError> {
        let query = format!("UPDATE {} SET display_order = $2 WHERE id = $1", kind.table());
        let mut tx = self.pool.begin().await?;

        for (position, id) in (1_i32..).zip(ids) {
            sqlx::query(&query)
                .bind(*id)
                .bind(position)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_slugs_round_trip() {
        for kind in MediaKind::ALL {
            assert_eq!(MediaKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(MediaKind::from_slug("slide"), None);
    }

    #[test]
    fn test_shape_banners_use_hyphenated_bucket() {
        assert_eq!(MediaKind::ShapeBanners.table(), "shape_banners");
        assert_eq!(MediaKind::ShapeBanners.bucket().name(), "shape-banners");
        assert_eq!(MediaKind::CategoryBanners.bucket().name(), "category-banners");
    }

    #[test]
    fn test_only_banners_need_target() {
        assert!(!MediaKind::Slides.needs_target());
        assert!(MediaKind::CategoryBanners.needs_target());
        assert!(MediaKind::ShapeBanners.needs_target());
        assert!(MediaKind::Slides.select_columns().contains("NULL::TEXT AS target"));
        assert!(MediaKind::ShapeBanners.select_columns().contains("shape AS target"));
    }
}

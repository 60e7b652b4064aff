//! Cached catalogue.
//!
//! Listing pages filter the whole product table in memory, so the table is
//! loaded once and kept in a `moka` cache until the TTL passes or an admin
//! write invalidates it. The lens table is cached the same way and narrowed
//! to a product's offer with [`lenses_for_product`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use eyeric_core::catalog::{FilterFacets, Product, ProductFilter};
use eyeric_core::lens::{Lens, lenses_for_product};
use eyeric_core::{LensId, ProductId};

use crate::db::{LensRepository, ProductRepository, RepositoryError};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Lenses,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Lenses(Arc<Vec<Lens>>),
}

/// One rendered listing: the matching products plus the sidebar facets of
/// the listing before checkbox, price and search filters were applied.
#[derive(Debug, Clone)]
pub struct Listing {
    pub products: Vec<Product>,
    pub facets: FilterFacets,
}

/// Catalogue access shared by every listing and product page.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(64).time_to_live(ttl).build();

        Self {
            inner: Arc::new(CatalogServiceInner { pool, cache }),
        }
    }

    /// The whole product table, in load order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the table cannot be loaded.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(&self.inner.pool).list_all().await?);
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        debug!(count = products.len(), "Loaded products");
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the table cannot be loaded.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products().await?;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    /// Filter and order the catalogue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the table cannot be loaded.
    #[instrument(skip(self, filter))]
    pub async fn listing(&self, filter: &ProductFilter) -> Result<Listing, RepositoryError> {
        let products = self.products().await?;
        Ok(build_listing(&products, filter))
    }

    /// The whole lens table, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the table cannot be loaded.
    #[instrument(skip(self))]
    pub async fn lenses(&self) -> Result<Arc<Vec<Lens>>, RepositoryError> {
        if let Some(CacheValue::Lenses(lenses)) = self.inner.cache.get(&CacheKey::Lenses).await {
            debug!("Cache hit for lenses");
            return Ok(lenses);
        }

        let lenses = Arc::new(LensRepository::new(&self.inner.pool).list_all().await?);
        self.inner
            .cache
            .insert(CacheKey::Lenses, CacheValue::Lenses(Arc::clone(&lenses)))
            .await;

        debug!(count = lenses.len(), "Loaded lenses");
        Ok(lenses)
    }

    /// Lenses offered for a product, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lenses cannot be loaded.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn lenses_for(&self, product: &Product) -> Result<Vec<Lens>, RepositoryError> {
        if !product.offers_lenses() {
            return Ok(Vec::new());
        }
        let lenses = self.lenses().await?;
        Ok(lenses_for_product(&lenses, product)
            .into_iter()
            .cloned()
            .collect())
    }

    /// A lens by id, only if it is offered for `product`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lenses cannot be loaded.
    pub async fn lens_for(
        &self,
        product: &Product,
        lens_id: LensId,
    ) -> Result<Option<Lens>, RepositoryError> {
        let lenses = self.lenses_for(product).await?;
        Ok(lenses.into_iter().find(|lens| lens.id == lens_id))
    }

    /// Replace the cached product and lens tables.
    pub async fn warm(&self, products: Vec<Product>, lenses: Vec<Lens>) {
        let cache = &self.inner.cache;
        cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::new(products)))
            .await;
        cache
            .insert(CacheKey::Lenses, CacheValue::Lenses(Arc::new(lenses)))
            .await;
    }

    /// Load both tables from the database into the cache.
    ///
    /// Returns the number of products and lenses loaded. The previous cache
    /// contents stay in place if either query fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a table cannot be loaded.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<(usize, usize), RepositoryError> {
        let products = ProductRepository::new(&self.inner.pool).list_all().await?;
        let lenses = LensRepository::new(&self.inner.pool).list_all().await?;
        let counts = (products.len(), lenses.len());
        self.warm(products, lenses).await;
        Ok(counts)
    }

    /// Drop every cached entry.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Apply `filter`, computing facets from the page's base selection (gender,
/// type and shape) so the sidebar does not shrink as boxes are ticked.
fn build_listing(products: &[Product], filter: &ProductFilter) -> Listing {
    let base = ProductFilter {
        gender: filter.gender.clone(),
        frame_type: filter.frame_type.clone(),
        shape: filter.shape.clone(),
        ..ProductFilter::default()
    };
    let facets = FilterFacets::from_products(products.iter().filter(|p| base.matches(p)));

    Listing {
        products: filter.apply(products).into_iter().cloned().collect(),
        facets,
    }
}

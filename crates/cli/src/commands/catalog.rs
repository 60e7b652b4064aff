//! Catalogue import.
//!
//! Reads a JSON export and inserts every product and lens. Ids in the file
//! are ignored; the database assigns new ones. Lens category ids are kept so
//! products and lenses stay linked.
//!
//! ```json
//! {
//!   "lenses": [{"id": 0, "title": "Blue Cut", "category": "single vision", "price": "999", "lens_category_id": 1}],
//!   "products": [{"id": 0, "title": "Aviator Gold", "original_price": "2499", "lens_category_id": 1}]
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use eyeric_core::catalog::Product;
use eyeric_core::lens::Lens;
use eyeric_storefront::db::{LensRepository, ProductRepository, RepositoryError};

use super::ConnectError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalogue JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid entry {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Contents of an import file.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub lenses: Vec<Lens>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl CatalogFile {
    /// Parse and sanity-check an import file.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Parse` for malformed JSON and
    /// `ImportError::Invalid` for blank titles or negative prices.
    pub fn parse(source: &str) -> Result<Self, ImportError> {
        let file: Self = serde_json::from_str(source)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), ImportError> {
        for (index, product) in self.products.iter().enumerate() {
            let label = || format!("products[{index}] ({})", product.title);
            if product.title.trim().is_empty() {
                return Err(ImportError::Invalid(format!("products[{index}]: title is blank")));
            }
            if product.original_price < Decimal::ZERO
                || product.discounted_price.is_some_and(|p| p < Decimal::ZERO)
            {
                return Err(ImportError::Invalid(format!("{}: negative price", label())));
            }
            if product.is_lens_used && product.lens_category_id.is_none() {
                return Err(ImportError::Invalid(format!(
                    "{}: offers lenses but has no lens_category_id",
                    label()
                )));
            }
        }

        for (index, lens) in self.lenses.iter().enumerate() {
            if lens.title.trim().is_empty() {
                return Err(ImportError::Invalid(format!("lenses[{index}]: title is blank")));
            }
            if lens.price < Decimal::ZERO {
                return Err(ImportError::Invalid(format!(
                    "lenses[{index}] ({}): negative price",
                    lens.title
                )));
            }
        }
        Ok(())
    }
}

/// Import products and lenses from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or an insert fails.
/// Rows inserted before a failure are kept.
pub async fn import(path: &Path) -> Result<(), ImportError> {
    let source = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let file = CatalogFile::parse(&source)?;

    let pool = super::connect().await?;

    let lenses = LensRepository::new(&pool);
    for lens in &file.lenses {
        let id = lenses.insert(lens).await?;
        tracing::debug!(%id, title = %lens.title, "Inserted lens");
    }

    let products = ProductRepository::new(&pool);
    for product in &file.products {
        let id = products.insert(product).await?;
        tracing::debug!(%id, title = %product.title, "Inserted product");
    }

    tracing::info!(
        lenses = file.lenses.len(),
        products = file.products.len(),
        "Catalogue import complete"
    );
    Ok(())
}

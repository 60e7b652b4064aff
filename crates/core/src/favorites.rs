//! Wishlist of product snapshots.
//!
//! Entries are copies of the product taken when it was favorited and are not
//! refreshed afterwards. Anonymous visitors keep their list in the session;
//! on login it is merged into the account's list with [`Favorites::merge`].

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::ProductId;

/// Ordered favorites, at most one entry per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Product>", into = "Vec<Product>")]
pub struct Favorites {
    entries: Vec<Product>,
}

impl Favorites {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[Product] {
        &self.entries
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.entries.iter().any(|p| p.id == product_id)
    }

    /// Append a product. Returns `false` if it was already there.
    pub fn add(&mut self, product: Product) -> bool {
        if self.contains(product.id) {
            return false;
        }
        self.entries.push(product);
        true
    }

    /// Returns `false` if the product was not a favorite.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|p| p.id != product_id);
        self.entries.len() != before
    }

    /// Add or remove. Returns whether the product is a favorite afterwards.
    pub fn toggle(&mut self, product: Product) -> bool {
        if self.remove(product.id) {
            false
        } else {
            self.entries.push(product);
            true
        }
    }

    /// Combine the account's list with a local one.
    ///
    /// Remote entries keep their order and their snapshot; local entries the
    /// account does not have yet are appended in local order.
    #[must_use]
    pub fn merge(local: Self, remote: Self) -> Self {
        let mut merged = remote;
        for product in local.entries {
            merged.add(product);
        }
        merged
    }
}

impl From<Vec<Product>> for Favorites {
    fn from(products: Vec<Product>) -> Self {
        let mut favorites = Self::new();
        for product in products {
            favorites.add(product);
        }
        favorites
    }
}

impl From<Favorites> for Vec<Product> {
    fn from(favorites: Favorites) -> Self {
        favorites.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::frame;

    fn ids(favorites: &Favorites) -> Vec<i32> {
        favorites.entries().iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut favorites = Favorites::new();
        assert!(favorites.add(frame(1, 100)));
        assert!(!favorites.add(frame(1, 100)));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut favorites = Favorites::new();
        assert!(favorites.toggle(frame(4, 100)));
        assert!(favorites.contains(ProductId::new(4)));
        assert!(!favorites.toggle(frame(4, 100)));
        assert!(favorites.is_empty());
        assert!(!favorites.remove(ProductId::new(4)));
    }

    #[test]
    fn test_merge_keeps_each_product_once() {
        let local = Favorites::from(vec![frame(1, 100), frame(2, 100)]);
        let remote = Favorites::from(vec![frame(3, 100), frame(2, 100)]);
        let merged = Favorites::merge(local, remote);
        assert_eq!(ids(&merged), vec![3, 2, 1]);
    }

    #[test]
    fn test_merge_prefers_remote_snapshot() {
        let mut stale = frame(1, 100);
        stale.title = "Local copy".into();
        let merged = Favorites::merge(
            Favorites::from(vec![stale]),
            Favorites::from(vec![frame(1, 100)]),
        );
        assert_eq!(merged.entries()[0].title, "Frame 1");
    }

    #[test]
    fn test_stored_duplicates_are_dropped() {
        let json = r#"[{"id": 1, "title": "A", "original_price": "10"},
                       {"id": 1, "title": "A", "original_price": "10"}]"#;
        let favorites: Favorites = serde_json::from_str(json).unwrap();
        assert_eq!(favorites.len(), 1);
        let back = serde_json::to_value(&favorites).unwrap();
        assert_eq!(back.as_array().unwrap().len(), 1);
    }
}

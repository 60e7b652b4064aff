//! Product catalogue and the listing engine.
//!
//! The storefront loads the whole `products` table and narrows it in memory.
//! Every listing page (all products, gender/type, shape, special category)
//! goes through [`ProductFilter::apply`]:
//!
//! 1. conjunctive filters (gender, type, shape, style/shape checkboxes, price
//!    range on the effective price, free-text search),
//! 2. ordering: explicit sort keys win; `Featured` uses the gender×type manual
//!    order when both are selected, otherwise the global `display_order`.
//!
//! All category comparisons go through [`normalize`].

mod filter;
mod product;
mod sort;

pub use filter::{FilterFacets, PriceRange, ProductFilter};
pub use product::{ColorVariant, DisplayOrders, FrameType, Gender, Product};
pub use sort::{SortKey, sort_products};

/// Canonical form for category comparisons: lowercase with spaces and
/// hyphens removed, so `"Power Sunglasses"`, `"power-sunglasses"` and
/// `"powersunglasses"` compare equal.
#[must_use]
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize an optional filter value, treating empty strings and `all` as
/// "no filter".
#[must_use]
pub fn normalize_selector(value: Option<&str>) -> Option<String> {
    value
        .map(normalize)
        .filter(|v| !v.is_empty() && v != "all")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal::Decimal;

    use super::{DisplayOrders, Product};
    use crate::types::ProductId;

    /// A men's round eyeglass frame with lenses enabled.
    pub(crate) fn frame(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Frame {id}"),
            description: String::new(),
            original_price: Decimal::new(price, 0),
            discounted_price: None,
            gender_category: vec!["Men".into()],
            type_category: vec!["Eyeglasses".into()],
            shape_category: Some("Round".into()),
            style_category: None,
            colors: Vec::new(),
            features: Vec::new(),
            is_lens_used: true,
            lens_category_id: None,
            display_order: None,
            display_orders: DisplayOrders::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_spaces_and_hyphens() {
        assert_eq!(normalize("Power Sunglasses"), "powersunglasses");
        assert_eq!(normalize("cat-eye"), "cateye");
        assert_eq!(normalize("  Round "), "round");
    }

    #[test]
    fn test_normalize_selector_wildcards() {
        assert_eq!(normalize_selector(None), None);
        assert_eq!(normalize_selector(Some("")), None);
        assert_eq!(normalize_selector(Some("All")), None);
        assert_eq!(normalize_selector(Some("Men")), Some("men".to_string()));
    }
}

//! Listing order.

use serde::{Deserialize, Serialize};

use super::product::{FrameType, Gender, Product};

/// Shopper-selected ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Merchandising order.
    #[default]
    Featured,
    #[serde(rename = "price-asc")]
    PriceLowToHigh,
    #[serde(rename = "price-desc")]
    PriceHighToLow,
    #[serde(rename = "name-asc")]
    Alphabetical,
}

impl SortKey {
    pub const ALL: [Self; 4] = [
        Self::Featured,
        Self::PriceLowToHigh,
        Self::PriceHighToLow,
        Self::Alphabetical,
    ];

    /// Parse a query-string value; anything unrecognised means `Featured`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "price-asc" | "price_low_high" => Self::PriceLowToHigh,
            "price-desc" | "price_high_low" => Self::PriceHighToLow,
            "name-asc" | "alphabetical" => Self::Alphabetical,
            _ => Self::Featured,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLowToHigh => "price-asc",
            Self::PriceHighToLow => "price-desc",
            Self::Alphabetical => "name-asc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceLowToHigh => "Price: Low to High",
            Self::PriceHighToLow => "Price: High to Low",
            Self::Alphabetical => "Name: A to Z",
        }
    }
}

/// Sort key for manual orders: present values ascending, missing ones last.
const fn manual_rank(order: Option<i32>) -> (bool, i32) {
    match order {
        Some(value) => (false, value),
        None => (true, 0),
    }
}

/// Order a filtered listing in place.
///
/// All sorts are stable, so ties (and products without a manual order) keep
/// the order they were loaded in. An explicit key always wins over the
/// merchandising order. `Featured` ranks by the gender×type order when
/// `combination` is set, falling back to the global `display_order`.
pub fn sort_products(
    products: &mut [&Product],
    key: SortKey,
    combination: Option<(Gender, FrameType)>,
) {
    match key {
        SortKey::Featured => match combination {
            Some((gender, frame_type)) => {
                products.sort_by_key(|p| {
                    (
                        manual_rank(p.display_orders.get(gender, frame_type)),
                        manual_rank(p.display_order),
                    )
                });
            }
            None => products.sort_by_key(|p| manual_rank(p.display_order)),
        },
        SortKey::PriceLowToHigh => products.sort_by_key(|p| p.effective_price()),
        SortKey::PriceHighToLow => {
            products.sort_by(|a, b| b.effective_price().cmp(&a.effective_price()));
        }
        SortKey::Alphabetical => products.sort_by_cached_key(|p| p.title.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DisplayOrders;
    use crate::catalog::fixtures::frame;

    fn ids(products: &[&Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_parse_unknown_is_featured() {
        assert_eq!(SortKey::parse("price-desc"), SortKey::PriceHighToLow);
        assert_eq!(SortKey::parse("bogus"), SortKey::Featured);
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_str()), key);
        }
    }

    #[test]
    fn test_price_sorts() {
        let catalog = [frame(1, 50), frame(2, 10), frame(3, 30)];
        let mut listing: Vec<&Product> = catalog.iter().collect();

        sort_products(&mut listing, SortKey::PriceLowToHigh, None);
        assert_eq!(ids(&listing), vec![2, 3, 1]);

        sort_products(&mut listing, SortKey::PriceHighToLow, None);
        assert_eq!(ids(&listing), vec![1, 3, 2]);
    }

    #[test]
    fn test_featured_global_order_missing_last_and_stable() {
        let mut catalog = [frame(1, 10), frame(2, 10), frame(3, 10), frame(4, 10)];
        catalog[1].display_order = Some(2);
        catalog[3].display_order = Some(1);
        let mut listing: Vec<&Product> = catalog.iter().collect();

        sort_products(&mut listing, SortKey::Featured, None);
        assert_eq!(ids(&listing), vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_featured_combination_falls_back_to_global_order() {
        let mut catalog = [frame(1, 10), frame(2, 10), frame(3, 10), frame(4, 10)];
        catalog[1].display_order = Some(1);
        catalog[2].display_orders =
            DisplayOrders::default().with(Gender::Men, FrameType::Eyeglasses, 1);
        catalog[3].display_order = Some(0);
        catalog[3].display_orders =
            DisplayOrders::default().with(Gender::Men, FrameType::Eyeglasses, 2);
        let mut listing: Vec<&Product> = catalog.iter().collect();

        sort_products(
            &mut listing,
            SortKey::Featured,
            Some((Gender::Men, FrameType::Eyeglasses)),
        );
        assert_eq!(ids(&listing), vec![3, 4, 2, 1]);
    }

    #[test]
    fn test_alphabetical_is_case_insensitive() {
        let mut catalog = [frame(1, 10), frame(2, 10), frame(3, 10)];
        catalog[0].title = "wayfarer".into();
        catalog[1].title = "Aviator".into();
        catalog[2].title = "Clubmaster".into();
        let mut listing: Vec<&Product> = catalog.iter().collect();

        sort_products(&mut listing, SortKey::Alphabetical, None);
        assert_eq!(ids(&listing), vec![2, 3, 1]);
    }
}

//! Conjunctive product filters and sidebar facets.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::{FrameType, Gender, Product};
use super::sort::{SortKey, sort_products};
use super::{normalize, normalize_selector};

/// Inclusive price bounds on the effective price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub fn new(min: Decimal, max: Decimal) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.min <= price && price <= self.max
    }
}

/// The active filter values of a listing page.
///
/// Empty strings and `"all"` in the single-value selectors mean "no filter",
/// so route parameters can be passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub gender: Option<String>,
    pub frame_type: Option<String>,
    pub shape: Option<String>,
    pub search: Option<String>,
    pub price: Option<PriceRange>,
    /// Style checkboxes; empty means any style.
    pub styles: Vec<String>,
    /// Shape checkboxes; empty means any shape.
    pub shapes: Vec<String>,
    pub sort: SortKey,
}

impl ProductFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn frame_type(mut self, frame_type: impl Into<String>) -> Self {
        self.frame_type = Some(frame_type.into());
        self
    }

    #[must_use]
    pub fn shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    #[must_use]
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    #[must_use]
    pub const fn price(mut self, range: PriceRange) -> Self {
        self.price = Some(range);
        self
    }

    #[must_use]
    pub const fn sort(mut self, key: SortKey) -> Self {
        self.sort = key;
        self
    }

    /// Gender×type combination whose manual order drives `Featured`, when both
    /// selectors name a known bucket.
    #[must_use]
    pub fn combination(&self) -> Option<(Gender, FrameType)> {
        let gender = Gender::parse(self.gender.as_deref()?)?;
        let frame_type = FrameType::parse(self.frame_type.as_deref()?)?;
        Some((gender, frame_type))
    }

    /// Whether a single product passes every active filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        CompiledFilter::new(self).matches(product)
    }

    /// Filter and order a catalogue for rendering.
    ///
    /// The result only ever contains references into `products`.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let compiled = CompiledFilter::new(self);
        let mut listing: Vec<&Product> = products.iter().filter(|p| compiled.matches(p)).collect();
        sort_products(&mut listing, self.sort, self.combination());
        listing
    }
}

/// Filter values normalized once per listing instead of once per product.
struct CompiledFilter {
    gender: Option<String>,
    frame_type: Option<String>,
    shape: Option<String>,
    search: Option<String>,
    price: Option<PriceRange>,
    styles: Vec<String>,
    shapes: Vec<String>,
}

impl CompiledFilter {
    fn new(filter: &ProductFilter) -> Self {
        let checkbox_set = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .map(|v| normalize(v))
                .filter(|v| !v.is_empty())
                .collect()
        };

        Self {
            gender: normalize_selector(filter.gender.as_deref()),
            frame_type: normalize_selector(filter.frame_type.as_deref()),
            shape: normalize_selector(filter.shape.as_deref()),
            search: filter
                .search
                .as_deref()
                .map(|q| q.trim().to_lowercase())
                .filter(|q| !q.is_empty()),
            price: filter.price,
            styles: checkbox_set(&filter.styles),
            shapes: checkbox_set(&filter.shapes),
        }
    }

    fn matches(&self, product: &Product) -> bool {
        if let Some(gender) = &self.gender
            && !product.has_gender(gender)
        {
            return false;
        }

        if let Some(frame_type) = &self.frame_type
            && !product.has_type(frame_type)
        {
            return false;
        }

        let shape = product.shape_category.as_deref().map(normalize);
        if let Some(wanted) = &self.shape
            && shape.as_ref() != Some(wanted)
        {
            return false;
        }
        if !self.shapes.is_empty() && !shape.is_some_and(|s| self.shapes.contains(&s)) {
            return false;
        }

        if !self.styles.is_empty() {
            let style = product.style_category.as_deref().map(normalize);
            if !style.is_some_and(|s| self.styles.contains(&s)) {
                return false;
            }
        }

        if let Some(range) = &self.price
            && !range.contains(product.effective_price())
        {
            return false;
        }

        self.search
            .as_deref()
            .is_none_or(|query| matches_search(product, query))
    }
}

/// Case-insensitive substring search over the text a shopper can see.
fn matches_search(product: &Product, query: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(query);

    contains(&product.title)
        || contains(&product.description)
        || product.gender_category.iter().any(|g| contains(g))
        || product.type_category.iter().any(|t| contains(t))
        || product.shape_category.as_deref().is_some_and(contains)
        || product.style_category.as_deref().is_some_and(contains)
}

/// Options offered by the filter sidebar for a set of products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterFacets {
    /// Distinct shapes (first-seen label per normalized value), sorted.
    pub shapes: Vec<String>,
    /// Distinct styles, sorted.
    pub styles: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl FilterFacets {
    #[must_use]
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut shapes = BTreeMap::new();
        let mut styles = BTreeMap::new();
        let mut min_price: Option<Decimal> = None;
        let mut max_price: Option<Decimal> = None;

        for product in products {
            if let Some(shape) = &product.shape_category {
                shapes.entry(normalize(shape)).or_insert_with(|| shape.clone());
            }
            if let Some(style) = &product.style_category {
                styles.entry(normalize(style)).or_insert_with(|| style.clone());
            }
            let price = product.effective_price();
            min_price = Some(min_price.map_or(price, |m| m.min(price)));
            max_price = Some(max_price.map_or(price, |m| m.max(price)));
        }

        Self {
            shapes: shapes.into_values().collect(),
            styles: styles.into_values().collect(),
            min_price,
            max_price,
        }
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

    fn catalog() -> Vec<Product> {
        let mut aviator = frame(1, 2499);
        aviator.title = "Aviator Classic".into();
        aviator.gender_category = vec!["Men".into(), "Women".into()];
        aviator.type_category = vec!["Sunglasses".into()];
        aviator.shape_category = Some("Aviator".into());
        aviator.style_category = Some("Full Rim".into());

        let mut cat_eye = frame(2, 1799);
        cat_eye.title = "Kitty".into();
        cat_eye.description = "A playful cat-eye for everyday wear".into();
        cat_eye.gender_category = vec!["Women".into()];
        cat_eye.type_category = vec!["Eyeglasses".into(), "Computer Glasses".into()];
        cat_eye.shape_category = Some("Cat-Eye".into());
        cat_eye.style_category = Some("Half Rim".into());
        cat_eye.discounted_price = Some(Decimal::new(999, 0));

        let mut round = frame(3, 100);
        round.title = "Round Kids".into();
        round.gender_category = vec!["Kids".into()];
        round.style_category = Some("Rimless".into());

        vec![aviator, cat_eye, round]
    }

    #[test]
    fn test_empty_filter_returns_everything() {
        let products = catalog();
        assert_eq!(ids(&ProductFilter::new().apply(&products)), vec![1, 2, 3]);
    }

    #[test]
    fn test_gender_and_type_are_normalized() {
        let products = catalog();
        let listing = ProductFilter::new()
            .gender("WOMEN")
            .frame_type("computer-glasses")
            .apply(&products);
        assert_eq!(ids(&listing), vec![2]);
    }

    #[test]
    fn test_all_selector_is_wildcard() {
        let products = catalog();
        let listing = ProductFilter::new().gender("all").shape("").apply(&products);
        assert_eq!(listing.len(), 3);
    }

    #[test]
    fn test_shape_equality() {
        let products = catalog();
        let listing = ProductFilter::new().shape("cat eye").apply(&products);
        assert_eq!(ids(&listing), vec![2]);
    }

    #[test]
    fn test_price_range_is_inclusive_on_effective_price() {
        let products = catalog();
        let listing = ProductFilter::new()
            .price(PriceRange::new(Decimal::ZERO, Decimal::new(100, 0)))
            .apply(&products);
        assert_eq!(ids(&listing), vec![3]);

        // Discounted 999 is in range even though the original 1799 is not.
        let listing = ProductFilter::new()
            .price(PriceRange::new(Decimal::new(999, 0), Decimal::new(1000, 0)))
            .apply(&products);
        assert_eq!(ids(&listing), vec![2]);
    }

    #[test]
    fn test_reversed_price_range_is_swapped() {
        let range = PriceRange::new(Decimal::new(500, 0), Decimal::new(100, 0));
        assert!(range.contains(Decimal::new(100, 0)));
        assert!(range.contains(Decimal::new(500, 0)));
    }

    #[test]
    fn test_search_spans_title_description_and_categories() {
        let products = catalog();
        assert_eq!(ids(&ProductFilter::new().search("KITTY").apply(&products)), vec![2]);
        assert_eq!(ids(&ProductFilter::new().search("playful").apply(&products)), vec![2]);
        assert_eq!(ids(&ProductFilter::new().search("rimless").apply(&products)), vec![3]);
        assert_eq!(ids(&ProductFilter::new().search("  ").apply(&products)).len(), 3);
        assert!(ProductFilter::new().search("titanium").apply(&products).is_empty());
    }

    #[test]
    fn test_checkbox_sets() {
        let products = catalog();
        let mut filter = ProductFilter::new();
        filter.styles = vec!["full-rim".into(), "Rimless".into()];
        assert_eq!(ids(&filter.apply(&products)), vec![1, 3]);

        filter.shapes = vec!["round".into()];
        assert_eq!(ids(&filter.apply(&products)), vec![3]);
    }

    #[test]
    fn test_combined_display_order_drives_featured() {
        let mut products = vec![frame(1, 10), frame(2, 10), frame(3, 10)];
        for (product, order) in products.iter_mut().zip([3, 1, 2]) {
            product.type_category = vec!["Sunglasses".into()];
            product.display_orders =
                DisplayOrders::default().with(Gender::Men, FrameType::Sunglasses, order);
        }

        let listing = ProductFilter::new()
            .gender("men")
            .frame_type("sunglasses")
            .apply(&products);
        let orders: Vec<_> = listing
            .iter()
            .filter_map(|p| p.display_orders.lookup("men", "sunglasses"))
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_explicit_sort_overrides_combined_order() {
        let mut products = vec![frame(1, 300), frame(2, 100)];
        products[0].display_orders =
            DisplayOrders::default().with(Gender::Men, FrameType::Eyeglasses, 1);
        products[1].display_orders =
            DisplayOrders::default().with(Gender::Men, FrameType::Eyeglasses, 2);

        let featured = ProductFilter::new().gender("men").frame_type("eyeglasses");
        assert_eq!(ids(&featured.clone().apply(&products)), vec![1, 2]);
        let by_price = featured.sort(SortKey::PriceLowToHigh);
        assert_eq!(ids(&by_price.apply(&products)), vec![2, 1]);
    }

    #[test]
    fn test_facets() {
        let products = catalog();
        let facets = FilterFacets::from_products(&products);
        assert_eq!(facets.shapes, vec!["Aviator", "Cat-Eye", "Round"]);
        assert_eq!(facets.styles, vec!["Full Rim", "Half Rim", "Rimless"]);
        assert_eq!(facets.min_price, Some(Decimal::new(100, 0)));
        assert_eq!(facets.max_price, Some(Decimal::new(2499, 0)));
    }
}

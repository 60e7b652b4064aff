//! Shopping cart.
//!
//! A cart is an ordered list of lines. Two lines are "the same" when they
//! share a [`LineKey`]: product id, lens id (or none) and power category (or
//! none). Adding a line with an existing key bumps that line's quantity
//! instead of appending, so the same frame can still appear twice with
//! different lenses.
//!
//! The whole cart is persisted as one JSON array (`user.cart_items`), so
//! [`Cart`] serializes transparently as a list of [`CartItem`]s.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::lens::Lens;
use crate::types::{LensId, PowerCategory, ProductId};

/// Lowest and highest sphere/cylinder/addition power accepted.
const POWER_LIMIT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
/// Power values come in quarter-diopter steps.
const POWER_STEP: Decimal = Decimal::from_parts(25, 0, 0, false, 2);
const MAX_AXIS: u16 = 180;

/// Invalid prescription values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowerError {
    #[error("{eye} {field} must be a number, got {value:?}")]
    NotANumber {
        eye: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{eye} {field} must be between -20.00 and +20.00")]
    OutOfRange {
        eye: &'static str,
        field: &'static str,
    },
    #[error("{eye} {field} must be a multiple of 0.25")]
    NotAQuarterStep {
        eye: &'static str,
        field: &'static str,
    },
    #[error("{eye} axis must be a whole number from 0 to 180")]
    InvalidAxis { eye: &'static str },
    #[error("{eye} axis is required when a cylinder power is given")]
    MissingAxis { eye: &'static str },
    #[error("at least one power value is required")]
    Empty,
}

/// Power for one eye, kept as the strings the customer typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyePower {
    #[serde(default)]
    pub sph: String,
    #[serde(default)]
    pub cyl: String,
    #[serde(default)]
    pub axis: String,
    #[serde(default, rename = "add")]
    pub add_power: String,
}

impl EyePower {
    fn is_empty(&self) -> bool {
        [&self.sph, &self.cyl, &self.axis, &self.add_power]
            .iter()
            .all(|v| v.trim().is_empty())
    }

    fn validate(&self, eye: &'static str) -> Result<(), PowerError> {
        validate_power(eye, "SPH", &self.sph)?;
        let cyl = validate_power(eye, "CYL", &self.cyl)?;
        validate_power(eye, "ADD", &self.add_power)?;

        let axis = self.axis.trim();
        if axis.is_empty() {
            if cyl.is_some_and(|c| !c.is_zero()) {
                return Err(PowerError::MissingAxis { eye });
            }
            return Ok(());
        }
        match axis.parse::<u16>() {
            Ok(value) if value <= MAX_AXIS => Ok(()),
            _ => Err(PowerError::InvalidAxis { eye }),
        }
    }
}

fn validate_power(
    eye: &'static str,
    field: &'static str,
    raw: &str,
) -> Result<Option<Decimal>, PowerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value = Decimal::from_str(raw.trim_start_matches('+')).map_err(|_| {
        PowerError::NotANumber {
            eye,
            field,
            value: raw.to_string(),
        }
    })?;
    if value.abs() > POWER_LIMIT {
        return Err(PowerError::OutOfRange { eye, field });
    }
    if !(value % POWER_STEP).is_zero() {
        return Err(PowerError::NotAQuarterStep { eye, field });
    }
    Ok(Some(value))
}

/// Manually entered prescription for both eyes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerDetails {
    #[serde(default)]
    pub left: EyePower,
    #[serde(default)]
    pub right: EyePower,
}

impl PowerDetails {
    /// Check both eyes. Blank fields are allowed, but not a blank form.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found, right eye first.
    pub fn validate(&self) -> Result<(), PowerError> {
        if self.left.is_empty() && self.right.is_empty() {
            return Err(PowerError::Empty);
        }
        self.right.validate("Right eye")?;
        self.left.validate("Left eye")
    }
}

/// Identity of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub lens_id: Option<LensId>,
    pub power_category: Option<PowerCategory>,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product as it was when added.
    pub product: Product,
    #[serde(default)]
    pub lens: Option<Lens>,
    #[serde(default, rename = "powerCategory")]
    pub power_category: Option<PowerCategory>,
    #[serde(default, rename = "powerDetails")]
    pub power_details: Option<PowerDetails>,
    #[serde(default, rename = "prescriptionImageUrl")]
    pub prescription_image_url: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// A single frame with no lens.
    #[must_use]
    pub const fn frame_only(product: Product) -> Self {
        Self {
            product,
            lens: None,
            power_category: Some(PowerCategory::FrameOnly),
            power_details: None,
            prescription_image_url: None,
            quantity: 1,
        }
    }

    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product.id,
            lens_id: self.lens.as_ref().map(|lens| lens.id),
            power_category: self.power_category,
        }
    }

    /// Frame plus lens, for one unit.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.product.effective_price() + self.lens.as_ref().map_or(Decimal::ZERO, |l| l.price)
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// The customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from stored lines, folding duplicate keys together and
    /// dropping zero-quantity lines.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add(item);
        }
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a line, merging into an existing line with the same key.
    pub fn add(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }
        let key = item.key();
        match self.items.iter_mut().find(|existing| existing.key() == key) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
    }

    /// Remove the line at `index`; out of range is a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<CartItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Remove the first line with `key`.
    pub fn remove_by_details(&mut self, key: &LineKey) -> Option<CartItem> {
        let index = self.position(key)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity at `index`. Zero removes the line.
    ///
    /// Returns `false` when `index` is out of range.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove_at(index).is_some();
        }
        match self.items.get_mut(index) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn contains(&self, key: &LineKey) -> bool {
        self.position(key).is_some()
    }

    /// Whether any line holds this product, whatever its lens.
    #[must_use]
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product.id == product_id)
    }

    #[must_use]
    pub fn position(&self, key: &LineKey) -> Option<usize> {
        self.items.iter().position(|item| item.key() == *key)
    }

    /// Sum of (frame + lens) × quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units, for the header badge.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// Fold another cart (e.g. the anonymous session cart) into this one.
    pub fn merge(&mut self, other: Self) {
        for item in other.items {
            self.add(item);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::frame;
    use crate::lens::fixtures::lens;
    use crate::types::LensKind;

    fn with_lens(product_id: i32, lens_id: i32, power: PowerCategory) -> CartItem {
        CartItem {
            product: frame(product_id, 1000),
            lens: Some(lens(lens_id, LensKind::SingleVision, 500)),
            power_category: Some(power),
            power_details: None,
            prescription_image_url: None,
            quantity: 1,
        }
    }

    #[test]
    fn test_same_triple_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(with_lens(1, 7, PowerCategory::Manual));
        cart.add(with_lens(1, 7, PowerCategory::Manual));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn test_different_lens_or_power_appends() {
        let mut cart = Cart::new();
        cart.add(with_lens(1, 7, PowerCategory::Manual));
        cart.add(with_lens(1, 8, PowerCategory::Manual));
        cart.add(with_lens(1, 7, PowerCategory::SubmitLater));
        cart.add(CartItem::frame_only(frame(1, 1000)));
        assert_eq!(cart.items().len(), 4);
    }

    #[test]
    fn test_total_includes_lens_and_discount() {
        let mut discounted = frame(2, 2000);
        discounted.discounted_price = Some(Decimal::new(1500, 0));
        let mut cart = Cart::new();
        cart.add(with_lens(1, 7, PowerCategory::Manual));
        cart.add(with_lens(1, 7, PowerCategory::Manual));
        cart.add(CartItem::frame_only(discounted));
        // (1000 + 500) * 2 + 1500
        assert_eq!(cart.total(), Decimal::new(4500, 0));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add(with_lens(1, 7, PowerCategory::Manual));
        cart.add(with_lens(2, 7, PowerCategory::Manual));
        assert!(cart.update_quantity(0, 3));
        assert_eq!(cart.count(), 4);
        assert!(cart.update_quantity(0, 0));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product.id, ProductId::new(2));
        assert!(!cart.update_quantity(5, 1));
    }

    #[test]
    fn test_remove_by_details_and_contains() {
        let mut cart = Cart::new();
        let item = with_lens(1, 7, PowerCategory::Prescription);
        let key = item.key();
        cart.add(item);
        assert!(cart.contains(&key));
        assert!(cart.contains_product(ProductId::new(1)));
        assert!(cart.remove_by_details(&key).is_some());
        assert!(!cart.contains(&key));
        assert!(cart.remove_by_details(&key).is_none());
        assert!(cart.remove_at(0).is_none());
    }

    #[test]
    fn test_from_items_folds_duplicates() {
        let cart = Cart::from_items([
            with_lens(1, 7, PowerCategory::Manual),
            with_lens(1, 7, PowerCategory::Manual),
            CartItem {
                quantity: 0,
                ..with_lens(3, 7, PowerCategory::Manual)
            },
        ]);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn test_stored_json_shape() {
        let json = r#"[{
            "product": {"id": 5, "title": "Wayfarer", "original_price": "1299"},
            "powerCategory": "frame only",
            "quantity": 2
        }]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.items()[0].power_category, Some(PowerCategory::FrameOnly));
        assert_eq!(cart.total(), Decimal::new(2598, 0));
    }

    #[test]
    fn test_power_validation() {
        let mut details = PowerDetails::default();
        assert_eq!(details.validate(), Err(PowerError::Empty));

        details.right.sph = "-2.25".into();
        details.left.sph = "+1.50".into();
        assert!(details.validate().is_ok());

        details.left.cyl = "-0.75".into();
        assert_eq!(
            details.validate(),
            Err(PowerError::MissingAxis { eye: "Left eye" })
        );
        details.left.axis = "180".into();
        assert!(details.validate().is_ok());
        details.left.axis = "181".into();
        assert!(matches!(details.validate(), Err(PowerError::InvalidAxis { .. })));
        details.left.axis = "90".into();

        details.right.add_power = "1.30".into();
        assert!(matches!(
            details.validate(),
            Err(PowerError::NotAQuarterStep { field: "ADD", .. })
        ));
        details.right.add_power = "-20.25".into();
        assert!(matches!(details.validate(), Err(PowerError::OutOfRange { .. })));
        details.right.add_power = "abc".into();
        assert!(matches!(details.validate(), Err(PowerError::NotANumber { .. })));
    }
}

//! Product model.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::normalize;
use crate::types::{LensCategoryId, ProductId};

/// A frame in the catalogue.
///
/// Also used as the denormalized snapshot embedded in cart lines and
/// favorites, so every field tolerates being absent in older JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub original_price: Decimal,
    #[serde(default)]
    pub discounted_price: Option<Decimal>,
    #[serde(default)]
    pub gender_category: Vec<String>,
    #[serde(default)]
    pub type_category: Vec<String>,
    #[serde(default)]
    pub shape_category: Option<String>,
    #[serde(default)]
    pub style_category: Option<String>,
    #[serde(default)]
    pub colors: Vec<ColorVariant>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_lens_used: bool,
    #[serde(default)]
    pub lens_category_id: Option<LensCategoryId>,
    /// Global manual merchandising order (lower first).
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub display_orders: DisplayOrders,
}

impl Product {
    /// Price the customer pays: the discounted price when set, else the original.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discounted_price.unwrap_or(self.original_price)
    }

    /// Whether a discount is actually applied.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discounted_price
            .is_some_and(|discounted| discounted < self.original_price)
    }

    /// Whole-percent discount for the "x% off" badge.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let discounted = self.discounted_price?;
        if self.original_price <= Decimal::ZERO || discounted >= self.original_price {
            return None;
        }
        let percent = (self.original_price - discounted) * Decimal::ONE_HUNDRED / self.original_price;
        percent.round().to_u32()
    }

    /// First image in variant order; variants without images are skipped.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.colors
            .iter()
            .flat_map(|variant| variant.images.iter())
            .next()
            .map(String::as_str)
    }

    /// Membership test against `gender_category` on normalized values.
    #[must_use]
    pub fn has_gender(&self, normalized_gender: &str) -> bool {
        self.gender_category
            .iter()
            .any(|g| normalize(g) == normalized_gender)
    }

    /// Membership test against `type_category` on normalized values.
    #[must_use]
    pub fn has_type(&self, normalized_type: &str) -> bool {
        self.type_category
            .iter()
            .any(|t| normalize(t) == normalized_type)
    }

    /// Plain sunglasses are sold frame-only; every other type can take lenses.
    #[must_use]
    pub fn is_sunglasses_only(&self) -> bool {
        !self.type_category.is_empty()
            && self
                .type_category
                .iter()
                .all(|t| FrameType::parse(t) == Some(FrameType::Sunglasses))
    }

    /// Whether adding this frame to the cart starts the lens selection steps.
    #[must_use]
    pub fn offers_lenses(&self) -> bool {
        self.is_lens_used && !self.is_sunglasses_only()
    }
}

/// One color option of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ColorVariant {
    /// Hex codes or color names (two-tone frames list several).
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Shopper-facing gender buckets that have their own manual ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
    Kids,
}

impl Gender {
    pub const ALL: [Self; 3] = [Self::Men, Self::Women, Self::Kids];

    /// Parse a raw category label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "men" => Some(Self::Men),
            "women" => Some(Self::Women),
            "kids" => Some(Self::Kids),
            _ => None,
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
            Self::Kids => "kids",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Men => 0,
            Self::Women => 1,
            Self::Kids => 2,
        }
    }
}

/// Frame types that have their own manual ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    Sunglasses,
    Eyeglasses,
    ComputerGlasses,
    PowerSunglasses,
}

impl FrameType {
    pub const ALL: [Self; 4] = [
        Self::Sunglasses,
        Self::Eyeglasses,
        Self::ComputerGlasses,
        Self::PowerSunglasses,
    ];

    /// Parse a raw category label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "sunglasses" => Some(Self::Sunglasses),
            "eyeglasses" => Some(Self::Eyeglasses),
            "computerglasses" => Some(Self::ComputerGlasses),
            "powersunglasses" => Some(Self::PowerSunglasses),
            _ => None,
        }
    }

    /// Normalized form used in column names and URLs.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Sunglasses => "sunglasses",
            Self::Eyeglasses => "eyeglasses",
            Self::ComputerGlasses => "computerglasses",
            Self::PowerSunglasses => "powersunglasses",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sunglasses => "Sunglasses",
            Self::Eyeglasses => "Eyeglasses",
            Self::ComputerGlasses => "Computer Glasses",
            Self::PowerSunglasses => "Power Sunglasses",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Sunglasses => 0,
            Self::Eyeglasses => 1,
            Self::ComputerGlasses => 2,
            Self::PowerSunglasses => 3,
        }
    }
}

/// The twelve gender×type manual display orders of a product.
///
/// Backed by the `{gender}_{type}_display_order` columns, e.g.
/// `men_sunglasses_display_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayOrders([[Option<i32>; 4]; 3]);

impl DisplayOrders {
    #[must_use]
    pub const fn get(&self, gender: Gender, frame_type: FrameType) -> Option<i32> {
        self.0[gender.index()][frame_type.index()]
    }

    pub const fn set(&mut self, gender: Gender, frame_type: FrameType, order: Option<i32>) {
        self.0[gender.index()][frame_type.index()] = order;
    }

    /// Builder-style [`Self::set`].
    #[must_use]
    pub const fn with(mut self, gender: Gender, frame_type: FrameType, order: i32) -> Self {
        self.set(gender, frame_type, Some(order));
        self
    }

    /// Look up by raw labels; unknown combinations have no order.
    #[must_use]
    pub fn lookup(&self, gender: &str, frame_type: &str) -> Option<i32> {
        self.get(Gender::parse(gender)?, FrameType::parse(frame_type)?)
    }

    /// Column holding the order for a combination.
    #[must_use]
    pub fn column_name(gender: Gender, frame_type: FrameType) -> String {
        format!("{}_{}_display_order", gender.slug(), frame_type.slug())
    }
}

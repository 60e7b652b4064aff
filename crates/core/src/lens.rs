//! Lens catalogue entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{LensCategoryId, LensId, LensKind};

/// A lens that can be fitted into a frame.
///
/// Cart lines embed a copy, so the price charged is the one seen when the
/// lens was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lens {
    pub id: LensId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(rename = "category")]
    pub kind: LensKind,
    pub price: Decimal,
    pub lens_category_id: LensCategoryId,
}

impl Lens {
    #[must_use]
    pub const fn needs_power(&self) -> bool {
        self.kind.needs_power()
    }
}

/// Lenses offered for a product: those in the product's lens category.
///
/// Products without a lens category, or with lenses disabled, get none.
#[must_use]
pub fn lenses_for_product<'a>(lenses: &'a [Lens], product: &Product) -> Vec<&'a Lens> {
    let Some(category) = product.lens_category_id.filter(|_| product.offers_lenses()) else {
        return Vec::new();
    };
    lenses
        .iter()
        .filter(|lens| lens.lens_category_id == category)
        .collect()
}

/// Narrow a lens list to one kind, for the second step of the picker.
#[must_use]
pub fn lenses_of_kind<'a>(
    lenses: impl IntoIterator<Item = &'a Lens>,
    kind: LensKind,
) -> Vec<&'a Lens> {
    lenses.into_iter().filter(|lens| lens.kind == kind).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn lens(id: i32, kind: LensKind, price: i64) -> Lens {
        Lens {
            id: LensId::new(id),
            title: format!("{kind} lens {id}"),
            description: String::new(),
            features: Vec::new(),
            kind,
            price: Decimal::new(price, 0),
            lens_category_id: LensCategoryId::new(1),
        }
    }
}

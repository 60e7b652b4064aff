//! Order snapshots.
//!
//! Orders are written by the checkout backend. The storefront only lists and
//! displays them, so these types mirror the stored row and add presentation
//! helpers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartItem, PowerDetails};
use crate::types::{OrderId, OrderStatus, PaymentStatus, PowerCategory, ProductId, UserId};

/// Delivery address captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default, alias = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, alias = "addressLine1")]
    pub address_line1: String,
    #[serde(default, alias = "addressLine2")]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, alias = "postalCode", alias = "pincode")]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Address lines for display, blank parts skipped.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let locality = [self.city.as_str(), self.state.as_str(), self.postal_code.as_str()]
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        [
            Some(self.full_name.clone()),
            Some(self.address_line1.clone()),
            self.address_line2.clone(),
            Some(locality),
            Some(self.country.clone()),
        ]
        .into_iter()
        .flatten()
        .filter(|line| !line.trim().is_empty())
        .collect()
    }
}

/// A purchased line, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub lens_title: Option<String>,
    #[serde(default)]
    pub lens_price: Option<Decimal>,
    #[serde(default)]
    pub power_category: Option<PowerCategory>,
    #[serde(default)]
    pub power_details: Option<PowerDetails>,
    #[serde(default)]
    pub prescription_image_url: Option<String>,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        (self.price + self.lens_price.unwrap_or_default()) * Decimal::from(self.quantity)
    }
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id,
            title: item.product.title.clone(),
            image: item.product.primary_image().map(str::to_string),
            price: item.product.effective_price(),
            lens_title: item.lens.as_ref().map(|l| l.title.clone()),
            lens_price: item.lens.as_ref().map(|l| l.price),
            power_category: item.power_category,
            power_details: item.power_details.clone(),
            prescription_image_url: item.prescription_image_url.clone(),
            quantity: item.quantity,
        }
    }
}

/// Money breakdown stored with the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Totals for a set of lines with no shipping, tax or discount.
    #[must_use]
    pub fn from_items(items: &[OrderItem]) -> Self {
        let subtotal = items.iter().map(OrderItem::line_total).sum();
        Self {
            subtotal,
            total: subtotal,
            ..Self::default()
        }
    }

    /// Whether the stored total agrees with its parts.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.subtotal + self.shipping + self.tax - self.discount == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub totals: OrderTotals,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// Timeline entries for the detail page: each forward step with whether it
    /// has been reached. Empty for cancelled or refunded orders.
    #[must_use]
    pub fn timeline(&self) -> Vec<(OrderStatus, bool)> {
        let Some(current) = self.status.progress_step() else {
            return Vec::new();
        };
        OrderStatus::ALL
            .iter()
            .filter_map(|status| status.progress_step().map(|step| (*status, step <= current)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::frame;
    use crate::lens::fixtures::lens;
    use crate::types::LensKind;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(1),
            order_number: "EYE-000001".into(),
            user_id: UserId::new(3),
            shipping_address: ShippingAddress::default(),
            items: Vec::new(),
            totals: OrderTotals::default(),
            payment_method: None,
            payment_status: PaymentStatus::Paid,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_timeline_marks_reached_steps() {
        let timeline = order(OrderStatus::Processing).timeline();
        let reached: Vec<bool> = timeline.iter().map(|(_, done)| *done).collect();
        assert_eq!(reached, vec![true, true, true, false, false]);
        assert!(order(OrderStatus::Cancelled).timeline().is_empty());
    }

    #[test]
    fn test_order_item_from_cart_line() {
        let mut item = CartItem::frame_only(frame(4, 1500));
        item.lens = Some(lens(2, LensKind::SingleVision, 700));
        item.quantity = 2;
        let line = OrderItem::from(&item);
        assert_eq!(line.line_total(), Decimal::new(4400, 0));
        assert_eq!(line.lens_price, Some(Decimal::new(700, 0)));

        let totals = OrderTotals::from_items(&[line]);
        assert_eq!(totals.total, Decimal::new(4400, 0));
        assert!(totals.is_consistent());
    }

    #[test]
    fn test_address_lines_skip_blanks() {
        let address = ShippingAddress {
            full_name: "Asha Rao".into(),
            address_line1: "12 MG Road".into(),
            city: "Bengaluru".into(),
            postal_code: "560001".into(),
            ..ShippingAddress::default()
        };
        assert_eq!(
            address.lines(),
            vec!["Asha Rao", "12 MG Road", "Bengaluru, 560001"]
        );
    }

    #[test]
    fn test_stored_address_accepts_camel_case() {
        let address: ShippingAddress =
            serde_json::from_str(r#"{"fullName": "A", "postalCode": "1"}"#).unwrap();
        assert_eq!(address.full_name, "A");
        assert_eq!(address.postal_code, "1");
    }
}

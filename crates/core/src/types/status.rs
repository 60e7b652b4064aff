//! Status and category enums shared by the storefront and the database.
//!
//! Values serialize to the exact strings stored in the database and in the
//! `cart_items` JSON column, some of which contain spaces (`"frame only"`).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an order.
///
/// `pending → confirmed → processing → shipped → delivered`, or one of the
/// terminal side exits `cancelled` / `refunded`. Orders are written by the
/// checkout backend; this crate only reads and presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Every status, in timeline order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Human label for badges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
        }
    }

    /// Icon name from the storefront's icon sprite.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Pending => "clock",
            Self::Confirmed => "check-circle",
            Self::Processing => "package",
            Self::Shipped => "truck",
            Self::Delivered => "home",
            Self::Cancelled => "x-circle",
            Self::Refunded => "rotate-ccw",
        }
    }

    /// Badge color token.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Pending => "yellow",
            Self::Confirmed => "blue",
            Self::Processing => "purple",
            Self::Shipped => "indigo",
            Self::Delivered => "green",
            Self::Cancelled => "red",
            Self::Refunded => "gray",
        }
    }

    /// One-line explanation shown on the order detail page.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pending => "We have received your order and are waiting for payment confirmation.",
            Self::Confirmed => "Your order is confirmed and will be prepared shortly.",
            Self::Processing => "Your frames and lenses are being prepared.",
            Self::Shipped => "Your order is on its way.",
            Self::Delivered => "Your order has been delivered.",
            Self::Cancelled => "This order was cancelled.",
            Self::Refunded => "This order was refunded.",
        }
    }

    /// Position on the delivery timeline; `None` for side exits.
    #[must_use]
    pub const fn progress_step(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::Shipped => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled | Self::Refunded => None,
        }
    }

    /// No further status changes are expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Refunded)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state recorded on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Payment pending",
            Self::Paid => "Paid",
            Self::Failed => "Payment failed",
            Self::Refunded => "Refunded",
        }
    }
}

/// How the customer supplies (or skips) prescription power for a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerCategory {
    #[serde(rename = "frame only")]
    FrameOnly,
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "saved")]
    Saved,
    #[serde(rename = "submit-later")]
    SubmitLater,
    #[serde(rename = "prescription")]
    Prescription,
}

impl PowerCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FrameOnly => "frame only",
            Self::Manual => "manual",
            Self::Saved => "saved",
            Self::SubmitLater => "submit-later",
            Self::Prescription => "prescription",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FrameOnly => "Frame only",
            Self::Manual => "Power entered manually",
            Self::Saved => "Using saved power",
            Self::SubmitLater => "Power to be submitted later",
            Self::Prescription => "Prescription uploaded",
        }
    }
}

impl fmt::Display for PowerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PowerCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frame only" => Ok(Self::FrameOnly),
            "manual" => Ok(Self::Manual),
            "saved" => Ok(Self::Saved),
            "submit-later" => Ok(Self::SubmitLater),
            "prescription" => Ok(Self::Prescription),
            _ => Err(format!("invalid power category: {s}")),
        }
    }
}

/// Lens category, which decides which selection steps a customer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "lens_kind"))]
pub enum LensKind {
    #[serde(rename = "single vision")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "single vision"))]
    SingleVision,
    #[serde(rename = "progressive")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "progressive"))]
    Progressive,
    #[serde(rename = "zero power")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "zero power"))]
    ZeroPower,
    #[serde(rename = "frame only")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "frame only"))]
    FrameOnly,
}

impl LensKind {
    pub const ALL: [Self; 4] = [
        Self::SingleVision,
        Self::Progressive,
        Self::ZeroPower,
        Self::FrameOnly,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleVision => "single vision",
            Self::Progressive => "progressive",
            Self::ZeroPower => "zero power",
            Self::FrameOnly => "frame only",
        }
    }

    /// Whether lenses of this kind need the customer's power.
    #[must_use]
    pub const fn needs_power(self) -> bool {
        matches!(self, Self::SingleVision | Self::Progressive)
    }
}

impl fmt::Display for LensKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Can manage other admin accounts.
    SuperAdmin,
    /// Can manage slides and banners.
    Admin,
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuperAdmin => f.write_str("super_admin"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_power_category_wire_names() {
        for category in [
            PowerCategory::FrameOnly,
            PowerCategory::Manual,
            PowerCategory::Saved,
            PowerCategory::SubmitLater,
            PowerCategory::Prescription,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
            assert_eq!(category.as_str().parse::<PowerCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_lens_kind_wire_names() {
        let kind: LensKind = serde_json::from_str("\"zero power\"").unwrap();
        assert_eq!(kind, LensKind::ZeroPower);
        assert!(!kind.needs_power());
        assert!(LensKind::Progressive.needs_power());
    }

    #[test]
    fn test_order_status_timeline() {
        let steps: Vec<_> = OrderStatus::ALL
            .iter()
            .filter_map(|s| s.progress_step())
            .collect();
        assert_eq!(steps, vec![0, 1, 2, 3, 4]);
        assert_eq!(OrderStatus::Cancelled.progress_step(), None);
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_order_status_presentation_is_distinct() {
        let colors: std::collections::HashSet<_> =
            OrderStatus::ALL.iter().map(|s| s.color()).collect();
        assert_eq!(colors.len(), OrderStatus::ALL.len());
        assert_eq!(OrderStatus::Shipped.icon(), "truck");
    }

    #[test]
    fn test_admin_role_parse() {
        assert_eq!("admin".parse::<AdminRole>().unwrap(), AdminRole::Admin);
        assert!("viewer".parse::<AdminRole>().is_err());
    }
}

//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

use eyeric_core::Price;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css, computed at build time.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Returns the content hash for lens-flow.js, computed at build time.
///
/// Usage in templates: `{{ ""|js_hash }}`
#[askama::filter_fn]
pub fn js_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("JS_HASH"))
}

/// Format a rupee amount: `₹1299.00`.
///
/// Usage in templates: `{{ product.price|rupees }}`
#[askama::filter_fn]
pub fn rupees(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_rupees(&amount.to_string()))
}

/// Two decimal places with the rupee sign; non-numeric input is shown as-is.
pub(crate) fn format_rupees(raw: &str) -> String {
    raw.parse::<Decimal>()
        .map_or_else(|_| raw.to_string(), |amount| Price::inr(amount).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees("1299"), "₹1299.00");
        assert_eq!(format_rupees("99.5"), "₹99.50");
        assert_eq!(format_rupees("n/a"), "n/a");
    }
}

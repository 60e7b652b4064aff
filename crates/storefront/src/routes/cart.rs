//! Cart route handlers.
//!
//! Forms post here and are redirected back to the cart page. `/cart/count`
//! answers the header badge script with JSON.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use eyeric_core::cart::{Cart, CartItem, LineKey};
use eyeric_core::{LensId, PowerCategory, ProductId};

use super::safe_return_path;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::CartService;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One cart line for display.
#[derive(Clone)]
pub struct CartLineView {
    pub index: usize,
    pub product_id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub lens_id: Option<LensId>,
    pub lens_title: Option<String>,
    /// Raw category, echoed back by the remove-item form.
    pub power_category: Option<&'static str>,
    pub power_label: Option<&'static str>,
    pub prescription_image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl CartLineView {
    fn new(index: usize, item: &CartItem) -> Self {
        Self {
            index,
            product_id: item.product.id,
            title: item.product.title.clone(),
            image: item.product.primary_image().map(str::to_string),
            lens_id: item.lens.as_ref().map(|l| l.id),
            lens_title: item.lens.as_ref().map(|l| l.title.clone()),
            power_category: item.power_category.map(PowerCategory::as_str),
            power_label: item.power_category.map(PowerCategory::label),
            prescription_image_url: item.prescription_image_url.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price(),
            line_total: item.line_total(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
    pub count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| CartLineView::new(index, item))
                .collect(),
            total: cart.total(),
            count: cart.count(),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add a frame without lenses.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    pub return_to: Option<String>,
}

/// Change the quantity of the line at `index`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub index: usize,
    pub quantity: u32,
}

/// Remove the line at `index`.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub index: usize,
}

/// Remove a line by what it contains rather than where it sits.
#[derive(Debug, Deserialize)]
pub struct RemoveItemForm {
    pub product_id: ProductId,
    pub lens_id: Option<LensId>,
    pub power_category: Option<String>,
}

impl RemoveItemForm {
    fn key(&self) -> Result<LineKey> {
        let power_category = match self.power_category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<PowerCategory>().map_err(AppError::BadRequest)?),
        };
        Ok(LineKey {
            product_id: self.product_id,
            lens_id: self.lens_id,
            power_category,
        })
    }
}

/// Cart badge response.
#[derive(Debug, Serialize)]
pub struct CartCountResponse {
    pub count: u32,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let cart = CartService::new(state.pool(), &session)
        .load(user.map(|u| u.id))
        .await?;

    Ok(CartShowTemplate {
        cart: CartView::from(&cart),
    })
}

/// Add a frame-only line.
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let product = state
        .catalog()
        .product(form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut item = CartItem::frame_only(product);
    item.quantity = form.quantity.unwrap_or(1).max(1);

    CartService::new(state.pool(), &session)
        .update(user.map(|u| u.id), |cart| cart.add(item.clone()))
        .await?;

    Ok(Redirect::to(&safe_return_path(
        form.return_to.as_deref(),
        "/cart",
    )))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state, session, user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let (_, found) = CartService::new(state.pool(), &session)
        .update(user.map(|u| u.id), |cart| {
            cart.update_quantity(form.index, form.quantity)
        })
        .await?;

    if !found {
        tracing::debug!(index = form.index, "Cart line already gone");
    }
    Ok(Redirect::to("/cart"))
}

/// Remove the line at an index.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    CartService::new(state.pool(), &session)
        .update(user.map(|u| u.id), |cart| cart.remove_at(form.index))
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Remove the first line matching product, lens and power category.
///
/// Index-based removal can hit the wrong line when another tab changed the
/// cart in between; this form identifies the line by content instead.
#[instrument(skip(state, session, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveItemForm>,
) -> Result<Redirect> {
    let key = form.key()?;
    CartService::new(state.pool(), &session)
        .update(user.map(|u| u.id), |cart| cart.remove_by_details(&key))
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(state, session, user))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Redirect> {
    CartService::new(state.pool(), &session)
        .update(user.map(|u| u.id), Cart::clear)
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Units in the cart, for the header badge.
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartCountResponse>> {
    let cart = CartService::new(state.pool(), &session)
        .load(user.map(|u| u.id))
        .await?;
    Ok(Json(CartCountResponse {
        count: cart.count(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_item_key() {
        let form = RemoveItemForm {
            product_id: ProductId::new(4),
            lens_id: Some(LensId::new(9)),
            power_category: Some("submit-later".into()),
        };
        let key = form.key().unwrap();
        assert_eq!(key.product_id, ProductId::new(4));
        assert_eq!(key.lens_id, Some(LensId::new(9)));
        assert_eq!(key.power_category, Some(PowerCategory::SubmitLater));
    }

    #[test]
    fn test_remove_item_blank_category_is_none() {
        let form = RemoveItemForm {
            product_id: ProductId::new(4),
            lens_id: None,
            power_category: Some(String::new()),
        };
        assert_eq!(form.key().unwrap().power_category, None);

        let form = RemoveItemForm {
            power_category: Some("bogus".into()),
            ..form
        };
        assert!(matches!(form.key(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_cart_view_empty() {
        let view = CartView::from(&Cart::new());
        assert!(view.lines.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
        assert_eq!(view.count, 0);
    }
}

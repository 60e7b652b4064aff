//! Favorites (wishlist) route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eyeric_core::ProductId;

use super::products::ProductCardView;
use super::safe_return_path;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::FavoritesService;
use crate::state::AppState;

/// Favorite toggle or removal form.
#[derive(Debug, Deserialize)]
pub struct FavoriteForm {
    pub product_id: ProductId,
    pub return_to: Option<String>,
}

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "favorites/index.html")]
pub struct FavoritesTemplate {
    pub products: Vec<ProductCardView>,
}

/// Display the favorites page.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let favorites = FavoritesService::new(state.pool(), &session)
        .load(user.map(|u| u.id))
        .await?;

    let products = favorites
        .entries()
        .iter()
        .map(|p| ProductCardView::new(p, &favorites))
        .collect();

    Ok(FavoritesTemplate { products })
}

/// Add or remove a product from favorites.
#[instrument(skip(state, session, user))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<FavoriteForm>,
) -> Result<Redirect> {
    let product = state
        .catalog()
        .product(form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let (_, now_favorite) = FavoritesService::new(state.pool(), &session)
        .toggle(user.map(|u| u.id), product)
        .await?;
    tracing::debug!(product_id = %form.product_id, now_favorite, "Toggled favorite");

    Ok(Redirect::to(&safe_return_path(
        form.return_to.as_deref(),
        "/favorites",
    )))
}

/// Remove a product from favorites.
///
/// Works for products that have since left the catalogue.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<FavoriteForm>,
) -> Result<Redirect> {
    FavoritesService::new(state.pool(), &session)
        .remove(user.map(|u| u.id), form.product_id)
        .await?;

    Ok(Redirect::to(&safe_return_path(
        form.return_to.as_deref(),
        "/favorites",
    )))
}

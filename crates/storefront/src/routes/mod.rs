//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//!
//! # Products
//! GET  /products                  - Listing (gender, type, shape, q, min, max, styles, shapes, sort)
//! GET  /product/{id}              - Product detail with lens options
//! GET  /{category}/{shape}        - Gender page by frame type or shape
//! GET  /shape-products?shape=     - All frames of a shape
//! GET  /special-category/{id}     - Curated category
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add frame only
//! POST /cart/update               - Set line quantity
//! POST /cart/remove               - Remove line by index
//! POST /cart/remove-item          - Remove line by product/lens/power
//! POST /cart/clear                - Empty cart
//! GET  /cart/count                - Badge count (JSON)
//!
//! # Favorites
//! GET  /favorites                 - Favorites page
//! POST /favorites/toggle          - Add or remove
//! POST /favorites/remove          - Remove
//!
//! # Orders (requires auth)
//! GET  /orders                    - Order history
//! GET  /orders/{id}               - Order detail
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/register             - Register page
//! POST /auth/register             - Register action
//! POST /auth/logout               - Logout action
//!
//! # API (JSON)
//! GET  /api/lens-flow             - Current lens selection step
//! POST /api/lens-flow/start       - Start lens selection for a product
//! POST /api/lens-flow/event       - Advance lens selection
//! POST /api/prescriptions         - Upload prescription image
//!
//! # Admin (see `admin`)
//! /admin/...
//!
//! # Content
//! GET  /about, /contact, /privacy, /terms, /shipping, /refund, /story, /size-guide
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod favorites;
pub mod home;
pub mod orders;
pub mod pages;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/product/{id}", get(products::show))
        .route("/shape-products", get(products::shape_products))
        .route("/special-category/{id}", get(products::special_category))
        .route("/{category}/{shape}", get(products::category))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/remove-item", post(cart::remove_item))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the favorites routes router.
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route("/toggle", post(favorites::toggle))
        .route("/remove", post(favorites::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/lens-flow", get(api::lens_flow::current))
        .route("/lens-flow/start", post(api::lens_flow::start))
        .route("/lens-flow/event", post(api::lens_flow::event))
        .route(
            "/prescriptions",
            post(api::prescriptions::upload).layer(DefaultBodyLimit::max(
                api::prescriptions::MAX_PRESCRIPTION_BYTES,
            )),
        )
        .layer(api_rate_limiter())
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(admin::login))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(admin::login_page))
        .merge(login)
        .route("/logout", post(admin::logout))
        .route("/dashboard", get(admin::dashboard))
        .route("/catalog/refresh", post(admin::refresh_catalog))
        .route(
            "/{kind}",
            post(admin::upload).layer(DefaultBodyLimit::max(admin::MAX_IMAGE_BYTES)),
        )
        .route("/{kind}/reorder", post(admin::reorder))
        .route("/{kind}/{id}/delete", post(admin::delete))
        .route("/{kind}/{id}/toggle", post(admin::toggle))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Cart routes
        .nest("/cart", cart_routes())
        // Favorites routes
        .nest("/favorites", favorites_routes())
        // Order history
        .nest("/orders", order_routes())
        // Auth routes
        .nest("/auth", auth_routes())
        // JSON API
        .nest("/api", api_routes())
        // Admin console
        .nest("/admin", admin_routes())
        // Content pages
        .merge(pages::router())
        // Product routes (last: `/{category}/{shape}` catches two-segment paths)
        .merge(product_routes())
}

/// A same-site path to redirect to after a form post.
///
/// Anything that is not a plain absolute path (`//host`, `https://…`,
/// backslash tricks) falls back to `fallback`.
pub(crate) fn safe_return_path(raw: Option<&str>, fallback: &str) -> String {
    raw.map(str::trim)
        .filter(|path| {
            path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control)
        })
        .map_or_else(|| fallback.to_string(), str::to_string)
}

//! Product listing and detail handlers.
//!
//! Every listing route (`/products`, `/{category}/{shape}`,
//! `/shape-products`, `/special-category/{id}`) funnels into the same
//! template; they differ only in the base filter they start from.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eyeric_core::catalog::{
    FilterFacets, FrameType, Gender, PriceRange, Product, ProductFilter, SortKey, normalize,
    sort_products,
};
use eyeric_core::favorites::Favorites;
use eyeric_core::lens::{Lens, lenses_of_kind};
use eyeric_core::{LensKind, ProductId, SpecialCategoryId};

use crate::db::{CategoryRepository, MediaRepository, ProductRepository, media::MediaKind};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::{CartService, FavoritesService};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Product card shown in grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount_percent: Option<u32>,
    pub shape: Option<String>,
    pub is_favorite: bool,
}

impl ProductCardView {
    pub fn new(product: &Product, favorites: &Favorites) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            image: product.primary_image().map(str::to_string),
            price: product.effective_price(),
            original_price: product.is_discounted().then_some(product.original_price),
            discount_percent: product.discount_percent(),
            shape: product.shape_category.clone(),
            is_favorite: favorites.contains(product.id),
        }
    }
}

/// A sort option in the listing toolbar.
#[derive(Clone)]
pub struct SortOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// A filter checkbox in the sidebar.
#[derive(Clone)]
pub struct FacetOptionView {
    pub value: String,
    pub checked: bool,
}

/// Group of lenses of one kind on the product page.
#[derive(Clone)]
pub struct LensGroupView {
    pub kind: LensKind,
    pub lenses: Vec<Lens>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Listing query string.
///
/// Checkbox groups travel as comma-separated lists; prices are parsed
/// leniently so an empty or garbled bound is simply ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListingQuery {
    pub gender: Option<String>,
    #[serde(rename = "type")]
    pub frame_type: Option<String>,
    pub shape: Option<String>,
    pub q: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub styles: Option<String>,
    pub shapes: Option<String>,
    pub sort: Option<String>,
}

impl ListingQuery {
    /// Layer the shopper's choices over a route's base filter.
    ///
    /// Base selectors from the path win over the same keys in the query.
    #[must_use]
    pub fn apply_to(&self, mut filter: ProductFilter) -> ProductFilter {
        if filter.gender.is_none() {
            filter.gender.clone_from(&self.gender);
        }
        if filter.frame_type.is_none() {
            filter.frame_type.clone_from(&self.frame_type);
        }
        if filter.shape.is_none() {
            filter.shape.clone_from(&self.shape);
        }
        filter.search = self.q.clone().filter(|q| !q.trim().is_empty());
        filter.styles = split_list(self.styles.as_deref());
        filter.shapes = split_list(self.shapes.as_deref());
        filter.sort = self.sort.as_deref().map_or(SortKey::Featured, SortKey::parse);

        let min = parse_price(self.min.as_deref());
        let max = parse_price(self.max.as_deref());
        filter.price = match (min, max) {
            (None, None) => None,
            (min, max) => Some(PriceRange::new(
                min.unwrap_or(Decimal::ZERO),
                max.unwrap_or(Decimal::MAX),
            )),
        };
        filter
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| Decimal::from_str(v).ok())
        .filter(|v| !v.is_sign_negative())
}

/// Query of `/shape-products`.
#[derive(Debug, Deserialize)]
pub struct ShapeQuery {
    pub shape: Option<String>,
    #[serde(flatten)]
    pub listing: ListingQuery,
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub heading: String,
    /// Path the filter form submits to.
    pub action: String,
    /// Carried as a hidden field on `/shape-products`.
    pub shape_param: Option<String>,
    pub banner: Option<String>,
    pub products: Vec<ProductCardView>,
    pub total: usize,
    pub sort_options: Vec<SortOptionView>,
    pub shapes: Vec<FacetOptionView>,
    pub styles: Vec<FacetOptionView>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub query: String,
    pub min: String,
    pub max: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub price: Decimal,
    pub is_discounted: bool,
    pub discount_percent: Option<u32>,
    pub images: Vec<String>,
    pub offers_lenses: bool,
    pub lens_groups: Vec<LensGroupView>,
    pub is_favorite: bool,
    /// Some line of the cart already holds this frame.
    pub in_cart: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the full catalogue with query-string filters.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let heading = heading_for(query.gender.as_deref(), query.frame_type.as_deref(), None);
    render_listing(
        &state,
        &session,
        user.map(|u| u.id),
        ProductFilter::new(),
        &query,
        heading,
        "/products".into(),
        None,
    )
    .await
}

/// Display a gender page narrowed by frame type or shape.
///
/// `/{category}/{shape}`: the first segment is the gender. The second is a
/// frame type when it names one (`/men/sunglasses`), otherwise a shape
/// (`/women/cat-eye`).
#[instrument(skip(state, session, user))]
pub async fn category(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path((category, second)): Path<(String, String)>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let gender = Gender::parse(&category)
        .ok_or_else(|| AppError::NotFound(format!("category {category}")))?;

    let mut filter = ProductFilter::new().gender(gender.slug());
    let heading = match FrameType::parse(&second) {
        Some(frame_type) => {
            filter = filter.frame_type(frame_type.slug());
            heading_for(Some(gender.slug()), Some(frame_type.slug()), None)
        }
        None => {
            filter = filter.shape(second.clone());
            heading_for(Some(gender.slug()), None, Some(&second))
        }
    };

    let banner = banner_for(&state, MediaKind::CategoryBanners, gender.slug()).await;
    let action = format!("/{}/{}", gender.slug(), second);
    render_listing(
        &state,
        &session,
        user.map(|u| u.id),
        filter,
        &query,
        heading,
        action,
        banner,
    )
    .await
}

/// Display every frame of one shape.
#[instrument(skip(state, session, user))]
pub async fn shape_products(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ShapeQuery>,
) -> Result<impl IntoResponse> {
    let shape = query
        .shape
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("shape is required".to_string()))?;

    let banner = banner_for(&state, MediaKind::ShapeBanners, &shape).await;
    let heading = heading_for(None, None, Some(&shape));
    let filter = ProductFilter::new().shape(shape.clone());
    let mut page = render_listing(
        &state,
        &session,
        user.map(|u| u.id),
        filter,
        &query.listing,
        heading,
        "/shape-products".to_string(),
        banner,
    )
    .await?;
    page.shape_param = Some(shape);
    Ok(page)
}

/// Display the products of a curated category, in the category's order
/// unless the shopper picks a sort.
#[instrument(skip(state, session, user))]
pub async fn special_category(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<SpecialCategoryId>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let category = CategoryRepository::new(state.pool())
        .get_special_category(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("special category {id}")))?;

    let products = ProductRepository::new(state.pool())
        .list_by_special_category(id)
        .await?;

    let filter = query.apply_to(ProductFilter::new());
    let facets = FilterFacets::from_products(&products);
    let mut listing: Vec<&Product> = products.iter().filter(|p| filter.matches(p)).collect();
    if query.sort.is_some() {
        sort_products(&mut listing, filter.sort, None);
    }

    let favorites = FavoritesService::new(state.pool(), &session)
        .load(user.map(|u| u.id))
        .await?;
    let cards = listing
        .into_iter()
        .map(|p| ProductCardView::new(p, &favorites))
        .collect();

    Ok(listing_template(
        category.name,
        format!("/special-category/{id}"),
        category.image_url,
        cards,
        &facets,
        &filter,
        &query,
    ))
}

/// Display a single frame with its lens options.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state
        .catalog()
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let lenses = state.catalog().lenses_for(&product).await?;
    let lens_groups = LensKind::ALL
        .into_iter()
        .map(|kind| LensGroupView {
            kind,
            lenses: lenses_of_kind(&lenses, kind).into_iter().cloned().collect(),
        })
        .filter(|group| !group.lenses.is_empty())
        .collect();

    let user_id = user.map(|u| u.id);
    let is_favorite = FavoritesService::new(state.pool(), &session)
        .load(user_id)
        .await?
        .contains(product.id);
    let in_cart = CartService::new(state.pool(), &session)
        .load(user_id)
        .await?
        .contains_product(product.id);

    Ok(ProductShowTemplate {
        price: product.effective_price(),
        is_discounted: product.is_discounted(),
        discount_percent: product.discount_percent(),
        images: product
            .colors
            .iter()
            .flat_map(|variant| variant.images.iter().cloned())
            .collect(),
        offers_lenses: product.offers_lenses(),
        lens_groups,
        is_favorite,
        in_cart,
        product,
    })
}

// =============================================================================
// Helpers
// =============================================================================

#[allow(clippy::too_many_arguments)]
async fn render_listing(
    state: &AppState,
    session: &Session,
    user: Option<eyeric_core::UserId>,
    base: ProductFilter,
    query: &ListingQuery,
    heading: String,
    action: String,
    banner: Option<String>,
) -> Result<ProductsIndexTemplate> {
    let filter = query.apply_to(base);
    let listing = state.catalog().listing(&filter).await?;
    let favorites = FavoritesService::new(state.pool(), session).load(user).await?;

    let cards = listing
        .products
        .iter()
        .map(|p| ProductCardView::new(p, &favorites))
        .collect();

    Ok(listing_template(
        heading,
        action,
        banner,
        cards,
        &listing.facets,
        &filter,
        query,
    ))
}

fn listing_template(
    heading: String,
    action: String,
    banner: Option<String>,
    products: Vec<ProductCardView>,
    facets: &FilterFacets,
    filter: &ProductFilter,
    query: &ListingQuery,
) -> ProductsIndexTemplate {
    let checked = |options: &[String], selected: &[String]| {
        options
            .iter()
            .map(|value| FacetOptionView {
                checked: selected.iter().any(|s| s.eq_ignore_ascii_case(value)),
                value: value.clone(),
            })
            .collect()
    };

    ProductsIndexTemplate {
        heading,
        action,
        shape_param: None,
        banner,
        total: products.len(),
        products,
        sort_options: SortKey::ALL
            .into_iter()
            .map(|key| SortOptionView {
                value: key.as_str(),
                label: key.label(),
                selected: key == filter.sort,
            })
            .collect(),
        shapes: checked(&facets.shapes, &filter.shapes),
        styles: checked(&facets.styles, &filter.styles),
        min_price: facets.min_price,
        max_price: facets.max_price,
        query: filter.search.clone().unwrap_or_default(),
        min: query.min.clone().unwrap_or_default(),
        max: query.max.clone().unwrap_or_default(),
    }
}

/// First active banner for a category or shape page, if any.
async fn banner_for(state: &AppState, kind: MediaKind, target: &str) -> Option<String> {
    let target = normalize(target);
    match MediaRepository::new(state.pool()).list_active(kind).await {
        Ok(items) => items
            .into_iter()
            .find(|item| {
                item.target
                    .as_deref()
                    .is_some_and(|t| normalize(t) == target)
            })
            .map(|item| item.image_url),
        Err(e) => {
            tracing::warn!(kind = %kind, "Failed to load banners: {e}");
            None
        }
    }
}

/// Page heading such as "Men's Sunglasses" or "Round Frames".
fn heading_for(gender: Option<&str>, frame_type: Option<&str>, shape: Option<&str>) -> String {
    let gender = gender.and_then(Gender::parse).map(|g| match g {
        Gender::Men => "Men's",
        Gender::Women => "Women's",
        Gender::Kids => "Kids'",
    });
    let subject = frame_type
        .and_then(FrameType::parse)
        .map(|t| t.label().to_string())
        .or_else(|| shape.map(|s| format!("{} Frames", title_case(s))));

    match (gender, subject) {
        (Some(g), Some(s)) => format!("{g} {s}"),
        (Some(g), None) => format!("{g} Eyewear"),
        (None, Some(s)) => s,
        (None, None) => "All Eyewear".to_string(),
    }
}

fn title_case(value: &str) -> String {
    value
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use eyeric_core::catalog::{FrameType, Gender, ProductFilter};

use super::products::ProductCardView;
use crate::db::media::{MediaItem, MediaKind};
use crate::db::categories::{Category, SpecialCategory};
use crate::db::{CategoryRepository, MediaRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::FavoritesService;
use crate::state::AppState;

/// Number of featured frames under the hero.
const FEATURED_COUNT: usize = 8;

/// Link tile to a gender × frame type listing.
#[derive(Clone)]
pub struct ShopLinkView {
    pub href: String,
    pub label: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Active hero slides, in display order.
    pub slides: Vec<MediaItem>,
    pub banners: Vec<MediaItem>,
    pub categories: Vec<Category>,
    pub special_categories: Vec<SpecialCategory>,
    pub featured: Vec<ProductCardView>,
    pub shop_links: Vec<ShopLinkView>,
}

/// Display the home page.
///
/// Media and category failures degrade to empty sections; only the product
/// catalogue is required.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let media = MediaRepository::new(state.pool());
    let categories = CategoryRepository::new(state.pool());

    let slides = media.list_active(MediaKind::Slides).await.unwrap_or_else(|e| {
        tracing::error!("Failed to load slides: {e}");
        Vec::new()
    });
    let banners = media
        .list_active(MediaKind::CategoryBanners)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load category banners: {e}");
            Vec::new()
        });
    let category_tiles = categories.list_categories().await.unwrap_or_else(|e| {
        tracing::error!("Failed to load categories: {e}");
        Vec::new()
    });
    let special_categories = categories
        .list_special_categories()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load special categories: {e}");
            Vec::new()
        });

    let listing = state.catalog().listing(&ProductFilter::new()).await?;
    let favorites = FavoritesService::new(state.pool(), &session)
        .load(user.map(|u| u.id))
        .await?;
    let featured = listing
        .products
        .iter()
        .take(FEATURED_COUNT)
        .map(|p| ProductCardView::new(p, &favorites))
        .collect();

    Ok(HomeTemplate {
        slides,
        banners,
        categories: category_tiles,
        special_categories,
        featured,
        shop_links: shop_links(),
    })
}

fn shop_links() -> Vec<ShopLinkView> {
    Gender::ALL
        .into_iter()
        .flat_map(|gender| {
            [FrameType::Eyeglasses, FrameType::Sunglasses]
                .into_iter()
                .map(move |frame_type| ShopLinkView {
                    href: format!("/{}/{}", gender.slug(), frame_type.slug()),
                    label: format!("{} {}", capitalize(gender.slug()), frame_type.label()),
                })
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_links_cover_every_gender() {
        let links = shop_links();
        assert_eq!(links.len(), 6);
        assert_eq!(links[0].href, "/men/eyeglasses");
        assert_eq!(links[0].label, "Men Eyeglasses");
        assert!(links.iter().any(|l| l.href == "/kids/sunglasses"));
    }
}

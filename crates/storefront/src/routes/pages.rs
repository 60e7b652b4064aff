//! Static content page route handlers.
//!
//! Serves the markdown pages from `content/pages` (about, policies, size
//! guide) at top-level paths such as `/privacy`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Pages served at `/{slug}`.
pub const PAGE_SLUGS: [&str; 8] = [
    "about",
    "contact",
    "privacy",
    "terms",
    "shipping",
    "refund",
    "story",
    "size-guide",
];

/// Link to another content page.
#[derive(Clone)]
pub struct PageLinkView {
    pub href: String,
    pub title: String,
    pub current: bool,
}

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub title: String,
    pub description: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
    pub links: Vec<PageLinkView>,
}

/// Serve a content page by slug.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
fn serve_content_page(state: &AppState, slug: &str) -> Result<ContentPageTemplate> {
    let content = state.content();
    let page = content
        .get_page(slug)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    Ok(ContentPageTemplate {
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
        links: content
            .footer_pages()
            .into_iter()
            .map(|p| PageLinkView {
                href: format!("/{}", p.slug),
                title: p.meta.title.clone(),
                current: p.slug == slug,
            })
            .collect(),
    })
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    PAGE_SLUGS.into_iter().fold(Router::new(), |router, slug| {
        router.route(
            &format!("/{slug}"),
            get(move |State(state): State<AppState>| async move {
                serve_content_page(&state, slug).map(IntoResponse::into_response)
            }),
        )
    })
}

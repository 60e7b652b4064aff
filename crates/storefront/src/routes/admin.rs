//! Admin console: login and homepage media management.
//!
//! # Routes (nested under `/admin`)
//!
//! ```text
//! GET  /login                 - Login page
//! POST /login                 - Login action
//! POST /logout                - Logout action
//! GET  /dashboard             - Slides and banners overview
//! POST /catalog/refresh       - Drop the cached product catalogue
//! POST /{kind}                - Upload (multipart: file, target, title, link_url)
//! POST /{kind}/reorder        - Set display order (form: ids=3,1,2)
//! POST /{kind}/{id}/delete    - Delete row and stored image
//! POST /{kind}/{id}/toggle    - Show/hide (optional form: active=true|false)
//! ```
//!
//! `{kind}` is `slides`, `category-banners` or `shape-banners`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eyeric_core::MediaId;
use eyeric_core::catalog::Gender;

use crate::db::MediaRepository;
use crate::db::media::{MediaItem, MediaKind, NewMedia};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;
use crate::storage::object_path;

/// Largest accepted slide or banner image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// Form Types
// =============================================================================

/// Admin login form data.
#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct AdminMessageQuery {
    pub error: Option<String>,
}

/// Visibility form; without `active` the current state is flipped.
#[derive(Debug, Default, Deserialize)]
pub struct ToggleForm {
    pub active: Option<bool>,
}

/// Reorder form: comma-separated ids in their new order.
#[derive(Debug, Deserialize)]
pub struct ReorderForm {
    pub ids: String,
}

impl ReorderForm {
    fn ids(&self) -> Result<Vec<MediaId>> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<MediaId>()
                    .map_err(|_| AppError::BadRequest(format!("invalid id: {s}")))
            })
            .collect()
    }
}

/// Fields of an upload other than the file itself.
#[derive(Debug, Default)]
struct UploadFields {
    target: Option<String>,
    title: Option<String>,
    link_url: Option<String>,
    file: Option<UploadedFile>,
}

#[derive(Debug)]
struct UploadedFile {
    name: Option<String>,
    content_type: String,
    bytes: Vec<u8>,
}

// =============================================================================
// Templates
// =============================================================================

/// Admin login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub error: Option<String>,
}

/// One media section of the dashboard.
#[derive(Clone)]
pub struct MediaSectionView {
    pub slug: &'static str,
    pub label: &'static str,
    pub needs_target: bool,
    /// Suggested targets for the upload form.
    pub target_options: Vec<String>,
    pub items: Vec<MediaItem>,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin: CurrentAdmin,
    pub sections: Vec<MediaSectionView>,
}

// =============================================================================
// Auth
// =============================================================================

/// Display the admin login page.
pub async fn login_page(Query(query): Query<AdminMessageQuery>) -> impl IntoResponse {
    AdminLoginTemplate {
        error: query
            .error
            .map(|_| "Invalid email or password.".to_string()),
    }
}

/// Handle admin login.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Response {
    match AuthService::new(state.pool())
        .login_admin(&form.email, &form.password)
        .await
    {
        Ok(admin) => {
            if let Err(e) = set_current_admin(&session, &CurrentAdmin::from(&admin)).await {
                tracing::error!("Failed to set admin session: {e}");
                return AppError::from(e).into_response();
            }
            tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");
            Redirect::to("/admin/dashboard").into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Admin login rejected");
            Redirect::to("/admin/login?error=credentials").into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Handle admin logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    Ok(Redirect::to("/admin/login"))
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display every slide and banner, including hidden ones.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let repo = MediaRepository::new(state.pool());
    let products = state.catalog().products().await?;

    let mut shapes: Vec<String> = products
        .iter()
        .filter_map(|p| p.shape_category.clone())
        .collect();
    shapes.sort_by_key(|s| s.to_lowercase());
    shapes.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

    let mut sections = Vec::with_capacity(MediaKind::ALL.len());
    for kind in MediaKind::ALL {
        let target_options = match kind {
            MediaKind::Slides => Vec::new(),
            MediaKind::CategoryBanners => {
                Gender::ALL.iter().map(|g| g.slug().to_string()).collect()
            }
            MediaKind::ShapeBanners => shapes.clone(),
        };
        sections.push(MediaSectionView {
            slug: kind.slug(),
            label: kind.label(),
            needs_target: kind.needs_target(),
            target_options,
            items: repo.list(kind).await?,
        });
    }

    Ok(DashboardTemplate { admin, sections })
}

/// Reload the cached catalogue so product edits show up immediately.
///
/// If the reload fails the cache is cleared instead, and the next page view
/// loads the tables itself.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn refresh_catalog(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Redirect {
    match state.catalog().reload().await {
        Ok((products, lenses)) => tracing::info!(products, lenses, "Catalogue reloaded"),
        Err(e) => {
            tracing::warn!("Catalogue reload failed, clearing cache: {e}");
            state.catalog().invalidate().await;
        }
    }
    Redirect::to("/admin/dashboard")
}

// =============================================================================
// Media
// =============================================================================

fn media_kind(slug: &str) -> Result<MediaKind> {
    MediaKind::from_slug(slug).ok_or_else(|| AppError::NotFound(format!("media kind {slug}")))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadFields> {
    let bad = |e: axum::extract::multipart::MultipartError| {
        AppError::BadRequest(format!("invalid upload: {e}"))
    };

    let mut fields = UploadFields::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        match field.name() {
            Some("file") => {
                let name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad)?.to_vec();
                fields.file = Some(UploadedFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            Some("target") => fields.target = non_blank(field.text().await.map_err(bad)?),
            Some("title") => fields.title = non_blank(field.text().await.map_err(bad)?),
            Some("link_url") => fields.link_url = non_blank(field.text().await.map_err(bad)?),
            _ => {}
        }
    }
    Ok(fields)
}

/// Upload an image and create its row.
///
/// If the row cannot be created, the uploaded object is deleted again so
/// the bucket does not collect orphans.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Redirect> {
    let kind = media_kind(&kind)?;
    let fields = read_upload(multipart).await?;

    if kind.needs_target() && fields.target.is_none() {
        return Err(AppError::BadRequest(format!(
            "{} need a target page",
            kind.label()
        )));
    }
    let file = fields
        .file
        .filter(|f| !f.bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("an image file is required".to_string()))?;
    if !file.content_type.starts_with("image/") {
        return Err(AppError::BadRequest("file must be an image".to_string()));
    }

    let bucket = kind.bucket();
    let prefix = fields
        .target
        .as_deref()
        .map_or_else(|| "home".to_string(), eyeric_core::catalog::normalize);
    let path = object_path(&prefix, file.name.as_deref());
    let image_url = state
        .storage()
        .upload(bucket, &path, file.bytes, &file.content_type)
        .await?;

    let media = NewMedia {
        target: if kind.needs_target() { fields.target } else { None },
        image_url,
        storage_path: path.clone(),
        title: fields.title,
        link_url: fields.link_url,
    };

    match MediaRepository::new(state.pool()).insert(kind, &media).await {
        Ok(item) => {
            tracing::info!(kind = %kind, id = %item.id, "Media uploaded");
            Ok(Redirect::to(&format!("/admin/dashboard#{}", kind.slug())))
        }
        Err(e) => {
            if let Err(cleanup) = state.storage().delete(bucket, &path).await {
                tracing::error!(bucket = %bucket, path = %path, "Failed to remove orphaned upload: {cleanup}");
            }
            Err(e.into())
        }
    }
}

/// Delete a row, then its stored image.
///
/// A failed storage delete is logged and leaves an unreferenced object.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((kind, id)): Path<(String, MediaId)>,
) -> Result<Redirect> {
    let kind = media_kind(&kind)?;
    let storage_path = MediaRepository::new(state.pool())
        .delete(kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{kind} {id}")))?;

    if let Err(e) = state.storage().delete(kind.bucket(), &storage_path).await {
        tracing::error!(kind = %kind, path = %storage_path, "Failed to delete stored image: {e}");
    }
    Ok(Redirect::to(&format!("/admin/dashboard#{}", kind.slug())))
}

/// Show or hide a row.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((kind, id)): Path<(String, MediaId)>,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect> {
    let kind = media_kind(&kind)?;
    let repo = MediaRepository::new(state.pool());
    let active = match form.active {
        Some(active) => {
            repo.set_active(kind, id, active).await?;
            active
        }
        None => repo.toggle_active(kind, id).await?,
    };

    tracing::info!(kind = %kind, %id, active, "Media visibility changed");
    Ok(Redirect::to(&format!("/admin/dashboard#{}", kind.slug())))
}

/// Set the display order of a media kind.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn reorder(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(kind): Path<String>,
    Form(form): Form<ReorderForm>,
) -> Result<Redirect> {
    let kind = media_kind(&kind)?;
    let ids = form.ids()?;
    MediaRepository::new(state.pool()).reorder(kind, &ids).await?;
    Ok(Redirect::to(&format!("/admin/dashboard#{}", kind.slug())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_ids() {
        let form = ReorderForm {
            ids: " 3, 1,,2 ".into(),
        };
        assert_eq!(
            form.ids().unwrap(),
            vec![MediaId::new(3), MediaId::new(1), MediaId::new(2)]
        );

        let form = ReorderForm { ids: "3,x".into() };
        assert!(matches!(form.ids(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_unknown_media_kind_is_not_found() {
        assert!(matches!(media_kind("slide"), Err(AppError::NotFound(_))));
        assert_eq!(media_kind("shape-banners").unwrap(), MediaKind::ShapeBanners);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  Round ".into()), Some("Round".to_string()));
        assert_eq!(non_blank("   ".into()), None);
    }
}

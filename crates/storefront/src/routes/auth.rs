//! Customer authentication route handlers.
//!
//! Handles login, registration and logout with email and password. A
//! successful login folds the guest's session cart and favorites into the
//! account.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::safe_return_path;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthError, AuthService, CartService, FavoritesService};
use crate::services::auth::MIN_PASSWORD_LENGTH;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub return_to: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub return_to: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
    pub return_to: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<&'static str>,
    pub min_password_length: usize,
}

/// Message for an `?error=` code.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "email" => "Please enter a valid email address.",
        "exists" => "An account with this email already exists.",
        "weak_password" => "Password is too short.",
        "mismatch" => "Passwords do not match.",
        "session" => "Could not start your session. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Message for a `?success=` code.
fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "logged_out" => Some("You have been logged out."),
        _ => None,
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().and_then(success_message),
        return_to: safe_return_path(query.return_to.as_deref(), "/"),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let target = safe_return_path(form.return_to.as_deref(), "/");
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => start_session(&state, &session, &user, &target).await,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login rejected");
            Redirect::to(&format!(
                "/auth/login?error=credentials&return_to={}",
                urlencoding::encode(&target)
            ))
            .into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        error: query.error.as_deref().map(error_message),
        min_password_length: MIN_PASSWORD_LENGTH,
    }
}

/// Handle registration form submission, logging the new customer in.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/register?error=mismatch").into_response();
    }

    match AuthService::new(state.pool())
        .register(&form.email, form.name.as_deref(), &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Customer registered");
            start_session(&state, &session, &user, "/").await
        }
        Err(AuthError::InvalidEmail(_)) => {
            Redirect::to("/auth/register?error=email").into_response()
        }
        Err(AuthError::WeakPassword(_)) => {
            Redirect::to("/auth/register?error=weak_password").into_response()
        }
        Err(AuthError::UserAlreadyExists) => {
            Redirect::to("/auth/register?error=exists").into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();
    Redirect::to("/auth/login?success=logged_out").into_response()
}

/// Log `user` in and merge their guest cart and favorites.
///
/// A failed merge leaves the guest data in the session and does not block
/// the login.
async fn start_session(state: &AppState, session: &Session, user: &User, target: &str) -> Response {
    if let Err(e) = set_current_user(session, &CurrentUser::from(user)).await {
        tracing::error!("Failed to set session: {e}");
        return Redirect::to("/auth/login?error=session").into_response();
    }
    set_sentry_user(&user.id, Some(user.email.as_str()));

    if let Err(e) = FavoritesService::new(state.pool(), session)
        .merge_on_login(user.id)
        .await
    {
        tracing::warn!(user_id = %user.id, "Failed to merge guest favorites: {e}");
    }
    if let Err(e) = CartService::new(state.pool(), session)
        .merge_on_login(user.id)
        .await
    {
        tracing::warn!(user_id = %user.id, "Failed to merge guest cart: {e}");
    }

    Redirect::to(target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_have_messages() {
        assert_eq!(error_message("credentials"), "Invalid email or password.");
        assert_eq!(error_message("mismatch"), "Passwords do not match.");
        assert_eq!(
            error_message("<script>"),
            "Something went wrong. Please try again."
        );
        assert_eq!(success_message("nope"), None);
    }
}

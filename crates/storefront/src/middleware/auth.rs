//! Authentication extractors.
//!
//! Customers and admins are tracked separately in the session, so an admin
//! browsing the shop is still a guest shopper unless they also log in as a
//! customer.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::session::{CurrentAdmin, CurrentUser, keys};

/// Extractor that requires a logged-in customer.
///
/// Page requests are redirected to the login page; `/api/` requests get a
/// bare 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {}", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in admin.
pub struct RequireAdmin(pub CurrentAdmin);

/// Extractor for pages that work for guests and customers alike.
pub struct OptionalAuth(pub Option<CurrentUser>);

/// Error returned when a login is required but missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to a login page (for HTML requests).
    RedirectTo(&'static str),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectTo(path) => Redirect::to(path).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

fn rejection(parts: &Parts, login_path: &'static str) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectTo(login_path)
    }
}

async fn session_value<T: serde::de::DeserializeOwned>(parts: &Parts, key: &str) -> Option<T> {
    let session = parts.extensions.get::<Session>()?;
    session.get::<T>(key).await.ok().flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_value::<CurrentUser>(parts, keys::CURRENT_USER)
            .await
            .map(Self)
            .ok_or_else(|| rejection(parts, "/auth/login"))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_value::<CurrentAdmin>(parts, keys::CURRENT_ADMIN)
            .await
            .map(Self)
            .ok_or_else(|| rejection(parts, "/admin/login"))
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            session_value::<CurrentUser>(parts, keys::CURRENT_USER).await,
        ))
    }
}

/// Store the logged-in customer, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Forget the logged-in customer (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    session.remove::<serde_json::Value>(keys::LENS_FLOW).await?;
    Ok(())
}

/// Store the logged-in admin, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_ADMIN, admin).await
}

/// Forget the logged-in admin.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentAdmin>(keys::CURRENT_ADMIN).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(path: &str) -> Parts {
        Request::builder().uri(path).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_api_requests_get_401() {
        assert_eq!(
            rejection(&parts("/api/lens-flow"), "/auth/login"),
            AuthRejection::Unauthorized
        );
    }

    #[test]
    fn test_pages_redirect_to_their_login() {
        assert_eq!(
            rejection(&parts("/orders"), "/auth/login"),
            AuthRejection::RedirectTo("/auth/login")
        );
        assert_eq!(
            rejection(&parts("/admin/dashboard"), "/admin/login"),
            AuthRejection::RedirectTo("/admin/login")
        );
    }

    #[tokio::test]
    async fn test_missing_session_layer_is_unauthenticated() {
        let mut parts = parts("/favorites");
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(user.is_none());

        let rejected = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(
            rejected,
            Err(AuthRejection::RedirectTo("/auth/login"))
        ));
    }
}

//! Session middleware configuration.
//!
//! Sessions live in `tower_sessions.session` and hold the logged-in
//! customer/admin, the guest cart and favorites, and the lens selection.
//! The session cookie is signed with a key derived from
//! `EYERIC_SESSION_SECRET`; a cookie with a bad signature starts a new session.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "eyeric_session";

/// Session layer whose cookie carries a signature.
pub type SignedSessionLayer<S> = SessionManagerLayer<S, SignedCookie>;

/// Session expiry after inactivity, in seconds (30 days, so guest carts survive).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with the `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SignedSessionLayer<PostgresStore> {
    configure_session_layer(SessionManagerLayer::new(PostgresStore::new(pool.clone())), config)
}

/// Apply the cookie settings shared by every session store.
#[must_use]
pub fn configure_session_layer<S: SessionStore>(
    layer: SessionManagerLayer<S>,
    config: &StorefrontConfig,
) -> SignedSessionLayer<S> {
    layer
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

/// Cookie signing key for a session secret.
///
/// SHA-512 output is exactly the 64 bytes `Key::from` requires.
fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable_per_secret() {
        let secret = SecretString::from("k3y-Material-for-the-session-cookie-0123456789");
        let other = SecretString::from("another-Secret-for-the-session-cookie-9876543210");

        assert_eq!(signing_key(&secret).signing(), signing_key(&secret).signing());
        assert_ne!(signing_key(&secret).signing(), signing_key(&other).signing());
    }
}

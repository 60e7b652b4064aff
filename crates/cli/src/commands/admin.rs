//! Admin account management.
//!
//! ```bash
//! eyeric-cli admin create -e admin@eyeric.in -n "Admin Name" -p '<password>' -r super_admin
//! ```

use eyeric_core::{AdminRole, AdminUserId};
use eyeric_storefront::services::{AuthError, AuthService};
use thiserror::Error;

use super::ConnectError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin")]
    InvalidRole(String),

    /// Email, password or uniqueness check failed.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create a new admin account with a password login.
///
/// # Errors
///
/// Returns `AdminError::InvalidRole` for an unknown role and
/// `AdminError::Auth` if the email is invalid or taken, or the password too
/// short.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<AdminUserId, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let pool = super::connect().await?;

    tracing::info!("Creating admin: {} ({})", email, role);
    let admin = AuthService::new(&pool)
        .create_admin(email, name, password, role)
        .await?;

    tracing::info!(
        "Admin created. ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );
    Ok(admin.id)
}

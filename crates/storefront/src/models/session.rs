//! Session-related types.
//!
//! Types stored in the session for authentication state, plus the keys for
//! the anonymous cart, favorites and the in-progress lens selection.

use serde::{Deserialize, Serialize};

use eyeric_core::{AdminRole, AdminUserId, Email, UserId};

use super::{Admin, User};

/// Session-stored customer identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Session-stored admin identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
}

impl From<&Admin> for CurrentAdmin {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Cart of a visitor who is not logged in.
    pub const CART: &str = "cart";

    /// Favorites of a visitor who is not logged in.
    pub const FAVORITES: &str = "favorites";

    /// Lens selection in progress.
    pub const LENS_FLOW: &str = "lens_flow";
}

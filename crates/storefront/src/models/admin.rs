//! Admin console account.

use chrono::{DateTime, Utc};

pub use eyeric_core::AdminRole;
use eyeric_core::{AdminUserId, Email};

/// An admin who manages slides and banners.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}

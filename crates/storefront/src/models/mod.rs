//! Domain models for the storefront.
//!
//! Catalogue, cart and order types live in `eyeric-core`; this module holds
//! the account types and what the session stores about them.

pub mod admin;
pub mod session;
pub mod user;

pub use admin::Admin;
pub use session::{CurrentAdmin, CurrentUser};
pub use user::User;

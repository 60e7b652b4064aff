//! Eyeric Core - Shared domain library.
//!
//! This crate provides the domain model and the storefront's reusable logic:
//! - `storefront` - Public-facing eyewear shop and admin media console
//! - `cli` - Command-line tools for migrations, admin accounts and catalog import
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Handlers fetch rows, hand them to these types and
//! persist whatever comes back.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails and status enums
//! - [`catalog`] - Product model and the filter/sort engine
//! - [`cart`] - Cart lines with (product, lens, power) de-duplication
//! - [`favorites`] - Wishlist with local/remote merge
//! - [`lens`] - Lens catalogue entries
//! - [`lens_flow`] - Lens & power selection state machine
//! - [`order`] - Order snapshots and status presentation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod lens;
pub mod lens_flow;
pub mod order;
pub mod types;

pub use types::*;

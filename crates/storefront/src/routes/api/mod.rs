//! JSON API handlers used by the storefront scripts.

pub mod lens_flow;
pub mod prescriptions;

//! Storefront checkout and cart-consistency engine.
//!
//! Carts, checkout, order assembly and payment reconciliation over `PostgreSQL`.

pub mod context;
pub mod database;
pub mod domain;
pub mod settings;

#[cfg(test)]
mod test;

mod uuids;

pub use uuids::TypedUuid;

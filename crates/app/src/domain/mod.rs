//! Storefront Domain Concerns

pub mod carts;
pub mod inventory;
pub mod orders;
pub mod owners;
pub mod payments;
pub mod products;
pub mod totals;

//! Catalog products.
//!
//! The catalog itself is owned elsewhere; checkout only reads products and
//! consumes their stock.

pub mod records;
pub(crate) mod repository;

pub use records::{ProductRecord, ProductStatus, ProductUuid};

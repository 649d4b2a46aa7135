//! Cart Data

use crate::domain::{inventory::Quantity, products::records::ProductUuid};

/// New Cart Item Data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_uuid: ProductUuid,
    pub quantity: Quantity,
}

/// Cart Item Update Data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItemUpdate {
    pub quantity: Quantity,
}

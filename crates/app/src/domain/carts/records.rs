//! Cart Records

use jiff::Timestamp;

use crate::{
    domain::{
        owners::OwnerKey,
        products::records::{ProductStatus, ProductUuid},
        totals::OrderTotals,
    },
    uuids::TypedUuid,
};

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// A stored cart line. `unit_price` is the catalog price when the line was
/// last added to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub owner: OwnerKey,
    pub product_uuid: ProductUuid,
    pub quantity: u64,
    pub unit_price: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A cart line joined with the product as it is right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CartItemRecord,
    pub product_name: String,
    pub product_status: ProductStatus,
    pub current_price: u64,
    pub stock: u64,
    pub line_total: u64,
}

/// Cart Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecord {
    pub owner: OwnerKey,
    pub lines: Vec<CartLine>,
    pub item_count: u64,
    pub totals: OrderTotals,
}

/// Outcome of folding a guest cart into a user cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Guest lines re-owned by the user.
    pub transferred: usize,
    /// User lines whose quantity was raised to the guest quantity.
    pub raised: usize,
    /// Guest lines dropped because the user already had as many or more.
    pub discarded: usize,
}

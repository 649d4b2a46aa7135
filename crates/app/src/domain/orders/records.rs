//! Order Records

use jiff::Timestamp;

use crate::{
    domain::{
        orders::status::{OrderStatus, PaymentStatus},
        owners::OwnerKey,
        products::records::ProductUuid,
        totals::OrderTotals,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// Postal address, copied onto each order rather than referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// Order Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub order_number: String,
    /// `None` for buy-now orders placed without any identity.
    pub owner: Option<OwnerKey>,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_session_id: Option<String>,
    pub payment_id: Option<String>,
    pub currency: String,
    pub totals: OrderTotals,
    pub billing: Address,
    pub shipping: Address,
    pub items: Vec<OrderItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Immutable snapshot of a purchased line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: u64,
    pub line_total: u64,
}

//! Order Handlers

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::records::{Address, OrderItemRecord, OrderRecord};

use crate::totals::TotalsResponse;

pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod payment;

/// Postal address, used both for checkout input and order snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddressPayload {
    pub name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl From<AddressPayload> for Address {
    fn from(payload: AddressPayload) -> Self {
        Self {
            name: payload.name,
            line1: payload.line1,
            line2: payload.line2,
            city: payload.city,
            region: payload.region,
            postal_code: payload.postal_code,
            country: payload.country,
        }
    }
}

impl From<Address> for AddressPayload {
    fn from(address: Address) -> Self {
        Self {
            name: address.name,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            region: address.region,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,

    /// Human-facing reference, e.g. `ORD-20260101-0A1B2C3D`
    pub order_number: String,

    /// Fulfilment status
    pub status: String,

    pub payment_status: String,

    pub customer_email: String,

    pub currency: String,

    pub totals: TotalsResponse,

    pub billing: AddressPayload,

    pub shipping: AddressPayload,

    pub items: Vec<OrderItemResponse>,

    pub created_at: String,

    pub updated_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            order_number: order.order_number,
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            customer_email: order.customer_email,
            currency: order.currency,
            totals: order.totals.into(),
            billing: order.billing.into(),
            shipping: order.shipping.into(),
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// Order Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    /// Product name at the time of purchase
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: u64,
    pub line_total: u64,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            uuid: item.uuid.into_uuid(),
            product_uuid: item.product_uuid.into_uuid(),
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total,
        }
    }
}

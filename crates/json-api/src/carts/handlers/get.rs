//! Get Cart Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{
    carts::records::{CartLine, CartRecord},
    products::records::ProductStatus,
};

use crate::{
    carts::errors::into_status_error, extensions::*, state::State, totals::TotalsResponse,
};

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// The lines in the cart, oldest first
    pub lines: Vec<CartLineResponse>,

    /// Total units across all lines
    pub item_count: u64,

    /// Totals at current catalog prices
    pub totals: TotalsResponse,
}

impl From<CartRecord> for CartResponse {
    fn from(cart: CartRecord) -> Self {
        Self {
            lines: cart.lines.into_iter().map(CartLineResponse::from).collect(),
            item_count: cart.item_count,
            totals: cart.totals.into(),
        }
    }
}

/// Cart Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineResponse {
    /// The unique identifier of the cart item
    pub uuid: Uuid,

    pub product_uuid: Uuid,

    pub product_name: String,

    /// Whether the product can still be bought
    pub available: bool,

    pub quantity: u64,

    /// Price captured when the item was last added
    pub unit_price: u64,

    /// Live catalog price used for totals
    pub current_price: u64,

    pub line_total: u64,

    /// Units currently in stock
    pub stock: u64,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            uuid: line.item.uuid.into_uuid(),
            product_uuid: line.item.product_uuid.into_uuid(),
            product_name: line.product_name,
            available: line.product_status == ProductStatus::Active,
            quantity: line.item.quantity,
            unit_price: line.item.unit_price,
            current_price: line.current_price,
            line_total: line.line_total,
            stock: line.stock,
        }
    }
}

/// Get Cart Handler
///
/// Returns the caller's cart priced at current catalog prices.
#[endpoint(
    tags("cart"),
    summary = "Get Cart",
    responses(
        (status_code = StatusCode::OK, description = "Cart returned"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No user or session"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_or_401()?;

    let cart = state
        .carts
        .get_cart(owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

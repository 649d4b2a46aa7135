//! Update Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{
    carts::{CartsServiceError, data::CartItemUpdate},
    inventory::Quantity,
};

use crate::{
    carts::{errors::into_status_error, items::handlers::CartItemResponse},
    extensions::*,
    state::State,
};

/// Update Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    /// New quantity for the line, replacing the old one
    pub quantity: u64,
}

impl TryFrom<UpdateCartItemRequest> for CartItemUpdate {
    type Error = CartsServiceError;

    fn try_from(request: UpdateCartItemRequest) -> Result<Self, Self::Error> {
        Ok(CartItemUpdate {
            quantity: Quantity::try_from(request.quantity)?,
        })
    }
}

/// Update Cart Item Handler
#[endpoint(
    tags("cart"),
    summary = "Update Cart Item",
    responses(
        (status_code = StatusCode::OK, description = "Cart item updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart item not found"),
        (status_code = StatusCode::CONFLICT, description = "Not enough stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid quantity"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.items.update",
    skip(item, json, depot),
    fields(
        item_uuid = tracing::field::Empty,
        quantity = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartItemResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_or_401()?;
    let item = item.into_inner();
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("item_uuid", tracing::field::display(item));
    span.record("quantity", request.quantity);

    let update = CartItemUpdate::try_from(request).map_err(into_status_error)?;

    let updated = state
        .carts
        .update_item(owner, item.into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}

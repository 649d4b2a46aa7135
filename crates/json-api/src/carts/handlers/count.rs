//! Cart Count Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Cart Count Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartCountResponse {
    /// Total units across all lines
    pub count: u64,
}

/// Cart Count Handler
#[endpoint(
    tags("cart"),
    summary = "Count Cart Items",
    responses(
        (status_code = StatusCode::OK, description = "Unit count returned"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No user or session"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartCountResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_or_401()?;

    let count = state
        .carts
        .get_count(owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(CartCountResponse { count }))
}

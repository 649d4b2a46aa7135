//! Start Payment Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::payments::PaymentRedirect;

use crate::{extensions::*, payments::errors::into_status_error, state::State};

/// Payment Redirect Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentRedirectResponse {
    pub order_uuid: Uuid,

    /// Provider session identifier
    pub session_id: String,

    /// Hosted payment page to send the customer to
    pub url: String,
}

impl From<PaymentRedirect> for PaymentRedirectResponse {
    fn from(redirect: PaymentRedirect) -> Self {
        Self {
            order_uuid: redirect.order_uuid.into_uuid(),
            session_id: redirect.session_id,
            url: redirect.url,
        }
    }
}

/// Start Payment Handler
///
/// Opens a hosted payment session for one of the caller's pending orders.
#[endpoint(
    tags("orders"),
    summary = "Start Payment",
    responses(
        (status_code = StatusCode::OK, description = "Payment session created"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order is not awaiting payment"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment provider unavailable"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No user or session"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.payment",
    skip(order, depot),
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<PaymentRedirectResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_or_401()?;
    let order = order.into_inner();

    tracing::Span::current().record("order_uuid", tracing::field::display(order));

    let redirect = state
        .payments
        .initiate_payment(Some(owner), order.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(redirect.into()))
}

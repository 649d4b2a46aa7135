//! Checkout Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use storefront_app::domain::{
    inventory::{InvalidQuantity, Quantity},
    orders::data::{LineRequest, NewOrder, OrderSource},
    owners::OwnerKey,
};

use crate::{
    extensions::*,
    observability::{observe_checkout_rejection, observe_order_created},
    orders::{
        errors::{into_status_error, rejection_reason},
        handlers::{AddressPayload, OrderResponse, payment::PaymentRedirectResponse},
    },
    state::State,
};

/// Checkout Line Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutLineRequest {
    pub product_uuid: Uuid,
    pub quantity: u64,
}

/// Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutRequest {
    /// Contact email, also used to pre-fill the payment page
    pub customer_email: String,

    pub billing: AddressPayload,

    /// Defaults to the billing address
    #[serde(default)]
    pub shipping: Option<AddressPayload>,

    /// Buy these lines directly instead of the cart. The cart is left alone.
    #[serde(default)]
    pub items: Option<Vec<CheckoutLineRequest>>,

    /// Remember the shipping address for a signed-in user
    #[serde(default)]
    pub save_shipping_address: bool,

    /// Open a hosted payment session as part of checkout
    #[serde(default)]
    pub start_payment: bool,
}

impl CheckoutRequest {
    fn into_new_order(self, owner: Option<OwnerKey>) -> Result<NewOrder, InvalidQuantity> {
        let source = match self.items {
            None => OrderSource::Cart,
            Some(lines) => OrderSource::Items(
                lines
                    .into_iter()
                    .map(|line| {
                        Ok(LineRequest {
                            product_uuid: line.product_uuid.into(),
                            quantity: Quantity::try_from(line.quantity)?,
                        })
                    })
                    .collect::<Result<_, InvalidQuantity>>()?,
            ),
        };

        let shipping = self.shipping.unwrap_or_else(|| self.billing.clone());

        Ok(NewOrder {
            owner,
            customer_email: self.customer_email,
            billing: self.billing.into(),
            shipping: shipping.into(),
            source,
            save_shipping_address: self.save_shipping_address,
        })
    }
}

/// Checkout Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutResponse {
    pub order: OrderResponse,

    /// Present when a payment session was requested and could be opened
    pub payment: Option<PaymentRedirectResponse>,
}

/// Checkout Handler
///
/// Turns the caller's cart (or an explicit item list) into a pending order.
/// Stock is reserved when this returns.
#[endpoint(
    tags("checkout"),
    summary = "Checkout",
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
        (status_code = StatusCode::CONFLICT, description = "Not enough stock or product unavailable"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Empty cart or invalid contact details"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Cart checkout without user or session"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.create",
    skip(json, depot, res),
    fields(
        owner_kind = tracing::field::Empty,
        source = tracing::field::Empty,
        order_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity().owner();
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("owner_kind", owner.as_ref().map_or("anonymous", OwnerKey::kind));
    span.record("source", if request.items.is_some() { "items" } else { "cart" });

    if request.items.is_none() && owner.is_none() {
        return Err(StatusError::unauthorized()
            .brief("Send x-user-id or x-session-id to check out a cart"));
    }

    let start_payment = request.start_payment;

    let order = request
        .into_new_order(owner.clone())
        .map_err(|error| StatusError::unprocessable_entity().brief(error.to_string()))?;

    let order = match state.orders.create_order(order).await {
        Ok(order) => order,
        Err(error) => {
            observe_checkout_rejection(rejection_reason(&error));

            return Err(into_status_error(error));
        }
    };

    observe_order_created();

    span.record("order_uuid", tracing::field::display(order.uuid));

    info!(order_number = %order.order_number, total = order.totals.total, "checked out");

    let payment = if start_payment {
        match state.payments.initiate_payment(owner, order.uuid).await {
            Ok(redirect) => Some(redirect.into()),
            Err(error) => {
                // The order stands; the client can retry the payment route.
                warn!(order_uuid = %order.uuid, "failed to open payment session: {error}");

                None
            }
        }
    } else {
        None
    };

    res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(CheckoutResponse {
        order: order.into(),
        payment,
    }))
}

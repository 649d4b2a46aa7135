//! Payment Webhook Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use storefront_app::domain::payments::PaymentsServiceError;

use crate::{
    extensions::*, observability::observe_webhook_outcome, payments::errors::into_status_error,
    state::State,
};

/// Header carrying `t=<unix>,v1=<hex hmac>` from the provider.
pub(crate) const SIGNATURE_HEADER: &str = "stripe-signature";

/// Webhook Acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WebhookAckResponse {
    pub received: bool,

    /// What the callback did: `paid`, `failed`, `already_processed`,
    /// `order_not_found`, `ignored` or `malformed`
    pub outcome: String,
}

impl WebhookAckResponse {
    fn new(outcome: &str) -> Self {
        Self {
            received: true,
            outcome: outcome.to_string(),
        }
    }
}

/// Payment Webhook Handler
///
/// Only unsigned or forged callbacks and storage failures are refused, so the
/// provider stops retrying anything we have already seen or cannot use.
#[endpoint(
    tags("payments"),
    summary = "Payment Provider Callback",
    responses(
        (status_code = StatusCode::OK, description = "Callback acknowledged"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing or invalid signature"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "payments.webhook",
    skip(req, depot),
    fields(outcome = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<WebhookAckResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let Some(signature) = req.header::<String>(SIGNATURE_HEADER) else {
        observe_webhook_outcome("rejected");

        return Err(StatusError::bad_request().brief("Missing payment signature"));
    };

    let payload = req.payload().await.map_err(|source| {
        warn!("failed to read payment callback body: {source}");

        StatusError::bad_request().brief("Unreadable payment payload")
    })?;

    let span = tracing::Span::current();

    match state
        .payments
        .handle_payment_callback(payload, &signature)
        .await
    {
        Ok(outcome) => {
            span.record("outcome", outcome.as_str());
            observe_webhook_outcome(outcome.as_str());

            info!(outcome = outcome.as_str(), "processed payment callback");

            Ok(Json(WebhookAckResponse::new(outcome.as_str())))
        }
        Err(PaymentsServiceError::InvalidPayload(source)) => {
            span.record("outcome", "malformed");
            observe_webhook_outcome("malformed");

            warn!("acknowledging signed but unreadable payment callback: {source}");

            Ok(Json(WebhookAckResponse::new("malformed")))
        }
        Err(error @ PaymentsServiceError::SignatureInvalid(_)) => {
            span.record("outcome", "rejected");
            observe_webhook_outcome("rejected");

            Err(into_status_error(error))
        }
        Err(error @ PaymentsServiceError::Persistence(_)) => {
            span.record("outcome", "error");
            observe_webhook_outcome("error");

            // Unacknowledged, so the provider redelivers once storage recovers.
            Err(into_status_error(error))
        }
        Err(error) => {
            span.record("outcome", "error");
            observe_webhook_outcome("error");

            error!("acknowledging payment callback that could not be applied: {error}");

            Ok(Json(WebhookAckResponse::new("error")))
        }
    }
}

//! Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use storefront_app::domain::payments::PaymentsServiceError;

pub(crate) fn into_status_error(error: PaymentsServiceError) -> StatusError {
    match error {
        PaymentsServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        PaymentsServiceError::InvalidState {
            status,
            payment_status,
        } => StatusError::conflict().brief(format!(
            "Order is not awaiting payment (status {status}, payment {payment_status})"
        )),
        PaymentsServiceError::SignatureInvalid(source) => {
            warn!("rejected payment callback: {source}");

            StatusError::bad_request().brief("Invalid payment signature")
        }
        PaymentsServiceError::InvalidPayload(source) => {
            warn!("unreadable payment callback: {source}");

            StatusError::bad_request().brief("Invalid payment payload")
        }
        PaymentsServiceError::Gateway(source) => {
            error!("payment provider failure: {source}");

            StatusError::bad_gateway().brief("Payment provider unavailable, try again")
        }
        PaymentsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Payment already recorded")
        }
        PaymentsServiceError::InvalidReference
        | PaymentsServiceError::MissingRequiredData
        | PaymentsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid payment data")
        }
        PaymentsServiceError::Persistence(source) => {
            error!("payment storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

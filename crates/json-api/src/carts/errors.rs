//! Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart item or product not found"),
        CartsServiceError::ProductUnavailable { name } => {
            StatusError::conflict().brief(format!("{name} is no longer available"))
        }
        CartsServiceError::InsufficientStock { name, available } => StatusError::conflict()
            .brief(format!("Only {available} of {name} available")),
        CartsServiceError::InvalidQuantity(source) => {
            StatusError::unprocessable_entity().brief(source.to_string())
        }
        CartsServiceError::Amount(source) => {
            StatusError::unprocessable_entity().brief(format!("Cart total {source}"))
        }
        CartsServiceError::AlreadyExists => StatusError::conflict().brief("Cart item already exists"),
        CartsServiceError::InvalidReference
        | CartsServiceError::MissingRequiredData
        | CartsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid cart payload")
        }
        CartsServiceError::Persistence(source) => {
            error!("cart storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

//! Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::EmptyCart => {
            StatusError::unprocessable_entity().brief("Nothing to check out, the cart is empty")
        }
        OrdersServiceError::UnknownProduct(product) => {
            StatusError::not_found().brief(format!("Product {product} not found"))
        }
        OrdersServiceError::ProductUnavailable { name } => {
            StatusError::conflict().brief(format!("{name} is no longer available"))
        }
        OrdersServiceError::InsufficientStock { name, available } => StatusError::conflict()
            .brief(format!("Only {available} of {name} available")),
        OrdersServiceError::InvalidState { from, to } => {
            StatusError::conflict().brief(format!("Order cannot move from {from} to {to}"))
        }
        OrdersServiceError::InvalidEmail => {
            StatusError::unprocessable_entity().brief("A valid customer email is required")
        }
        OrdersServiceError::IncompleteAddress(which) => {
            StatusError::unprocessable_entity().brief(format!("The {which} address is incomplete"))
        }
        OrdersServiceError::Amount(source) => {
            StatusError::unprocessable_entity().brief(format!("Order total {source}"))
        }
        OrdersServiceError::AlreadyExists => StatusError::conflict().brief("Order already exists"),
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::Persistence(source) => {
            error!("order storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

/// Metric label for a checkout that produced no order.
pub(crate) fn rejection_reason(error: &OrdersServiceError) -> &'static str {
    match error {
        OrdersServiceError::EmptyCart => "empty_cart",
        OrdersServiceError::UnknownProduct(_) | OrdersServiceError::NotFound => "unknown_product",
        OrdersServiceError::ProductUnavailable { .. } => "product_unavailable",
        OrdersServiceError::InsufficientStock { .. } => "insufficient_stock",
        OrdersServiceError::InvalidEmail | OrdersServiceError::IncompleteAddress(_) => {
            "invalid_contact"
        }
        OrdersServiceError::Persistence(_) => "storage",
        OrdersServiceError::InvalidState { .. }
        | OrdersServiceError::Amount(_)
        | OrdersServiceError::AlreadyExists
        | OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => "invalid",
    }
}

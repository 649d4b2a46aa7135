//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    inventory::InventoryRejection, orders::status::OrderStatus, products::records::ProductUuid,
    totals::TotalsError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("cart is empty")]
    EmptyCart,

    #[error("product {0} does not exist")]
    UnknownProduct(ProductUuid),

    #[error("{name} is no longer available")]
    ProductUnavailable { name: String },

    #[error("insufficient stock for {name}, only {available} available")]
    InsufficientStock { name: String, available: u64 },

    #[error("order cannot move from {from} to {to}")]
    InvalidState { from: OrderStatus, to: OrderStatus },

    #[error("a valid customer email is required")]
    InvalidEmail,

    #[error("{0} address is incomplete")]
    IncompleteAddress(&'static str),

    #[error("order already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error(transparent)]
    Amount(#[from] TotalsError),

    #[error("storage error")]
    Persistence(#[source] Error),
}

impl From<InventoryRejection> for OrdersServiceError {
    fn from(rejection: InventoryRejection) -> Self {
        match rejection {
            InventoryRejection::ProductUnavailable { name } => Self::ProductUnavailable { name },
            InventoryRejection::InsufficientStock { name, available } => {
                Self::InsufficientStock { name, available }
            }
        }
    }
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Persistence(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_rejections_keep_the_available_count() {
        let error = OrdersServiceError::from(InventoryRejection::InsufficientStock {
            name: "Lamp".to_string(),
            available: 2,
        });

        assert_eq!(
            error.to_string(),
            "insufficient stock for Lamp, only 2 available"
        );
    }

    #[test]
    fn invalid_transitions_name_both_states() {
        let error = OrdersServiceError::InvalidState {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled,
        };

        assert_eq!(error.to_string(), "order cannot move from shipped to cancelled");
    }
}

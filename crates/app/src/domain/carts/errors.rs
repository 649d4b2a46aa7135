//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    inventory::{InvalidQuantity, InventoryRejection},
    totals::TotalsError,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart item not found")]
    NotFound,

    #[error("{name} is no longer available")]
    ProductUnavailable { name: String },

    #[error("insufficient stock for {name}, only {available} available")]
    InsufficientStock { name: String, available: u64 },

    #[error(transparent)]
    InvalidQuantity(#[from] InvalidQuantity),

    #[error("cart item already exists")]
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

impl From<InventoryRejection> for CartsServiceError {
    fn from(rejection: InventoryRejection) -> Self {
        match rejection {
            InventoryRejection::ProductUnavailable { name } => Self::ProductUnavailable { name },
            InventoryRejection::InsufficientStock { name, available } => {
                Self::InsufficientStock { name, available }
            }
        }
    }
}

impl From<Error> for CartsServiceError {
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
    fn missing_rows_read_as_not_found() {
        assert!(matches!(
            CartsServiceError::from(Error::RowNotFound),
            CartsServiceError::NotFound
        ));
    }

    #[test]
    fn storage_errors_do_not_leak_details() {
        let error = CartsServiceError::from(Error::PoolTimedOut);

        assert_eq!(error.to_string(), "storage error");
    }
}

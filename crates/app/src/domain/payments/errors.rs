//! Payments service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    orders::status::{OrderStatus, PaymentStatus},
    payments::{gateway::PaymentGatewayError, signature::SignatureError},
};

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("order not found")]
    NotFound,

    #[error("order is not awaiting payment (status {status}, payment {payment_status})")]
    InvalidState {
        status: OrderStatus,
        payment_status: PaymentStatus,
    },

    #[error("webhook signature is invalid")]
    SignatureInvalid(#[from] SignatureError),

    #[error("webhook payload is malformed")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("payment provider request failed")]
    Gateway(#[from] PaymentGatewayError),

    #[error("payment reference already recorded")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Persistence(#[source] Error),
}

impl From<Error> for PaymentsServiceError {
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

//! `Result` helpers for handlers.

use std::fmt::Display;

use salvo::prelude::StatusError;
use tracing::error;

/// Failures the client cannot act on: log the cause, answer a bare 500.
pub(crate) trait OrInternalServerError<T> {
    fn or_500(self, context: &'static str) -> Result<T, StatusError>;
}

impl<T, E> OrInternalServerError<T> for Result<T, E>
where
    E: Display,
{
    fn or_500(self, context: &'static str) -> Result<T, StatusError> {
        self.map_err(|source| {
            error!(%source, "{context}");

            StatusError::internal_server_error()
        })
    }
}

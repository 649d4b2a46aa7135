//! Payments
//!
//! Hosted payment sessions going out, signed provider callbacks coming in.

pub mod errors;
pub mod events;
pub mod gateway;
pub(crate) mod repository;
pub mod service;
pub mod signature;

pub use errors::PaymentsServiceError;
pub use service::*;

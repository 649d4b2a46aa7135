//! Checkout

pub(crate) mod handler;

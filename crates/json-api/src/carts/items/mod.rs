//! Cart Items

pub(crate) mod handlers;

//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use storefront_app::domain::owners::OwnerKey;

use crate::identity::Identity;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_identity(&mut self, identity: Identity);

    /// Identity headers seen on this request. Anonymous when the identity
    /// middleware did not run.
    fn identity(&self) -> Identity;

    /// The cart owner this request addresses, or 401 when the caller sent
    /// neither a user nor a session.
    fn owner_or_401(&self) -> Result<OwnerKey, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_identity(&mut self, identity: Identity) {
        self.inject(identity);
    }

    fn identity(&self) -> Identity {
        self.obtain::<Identity>().cloned().unwrap_or_default()
    }

    fn owner_or_401(&self) -> Result<OwnerKey, StatusError> {
        self.identity().owner().ok_or_else(|| {
            StatusError::unauthorized().brief("Send x-user-id or x-session-id to identify the cart")
        })
    }
}

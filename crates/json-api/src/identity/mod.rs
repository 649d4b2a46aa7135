//! Request identity.
//!
//! Users are authenticated upstream and arrive as a verified `x-user-id`
//! header. Anonymous shoppers carry an opaque `x-session-id` token instead.

pub(crate) mod middleware;

use storefront_app::domain::owners::{OwnerKey, SessionId, UserUuid};

pub(crate) const USER_ID_HEADER: &str = "x-user-id";
pub(crate) const SESSION_ID_HEADER: &str = "x-session-id";

/// Identity headers carried by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) user: Option<UserUuid>,
    pub(crate) session: Option<SessionId>,
}

impl Identity {
    /// The owner key this request's cart is stored under.
    pub(crate) fn owner(&self) -> Option<OwnerKey> {
        OwnerKey::resolve(self.user, self.session.clone())
    }
}

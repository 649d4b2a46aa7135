//! Cart and order ownership.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;
use uuid::Uuid;

use crate::uuids::TypedUuid;

/// Longest session token accepted from a client.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Marker for identities verified by the upstream identity provider.
#[derive(Debug)]
pub struct User;

/// Verified user identifier.
pub type UserUuid = TypedUuid<User>;

/// Opaque client-supplied token identifying an anonymous cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionIdError {
    #[error("session id is empty")]
    Empty,

    #[error("session id exceeds {MAX_SESSION_ID_LEN} characters")]
    TooLong,

    #[error("session id contains characters outside printable ASCII")]
    InvalidCharacters,
}

impl SessionId {
    /// Validate a raw session token.
    ///
    /// # Errors
    ///
    /// Rejects empty, oversized or non-printable tokens.
    pub fn parse(raw: &str) -> Result<Self, SessionIdError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(SessionIdError::Empty);
        }

        if trimmed.len() > MAX_SESSION_ID_LEN {
            return Err(SessionIdError::TooLong);
        }

        if !trimmed.bytes().all(|byte| byte.is_ascii_graphic()) {
            return Err(SessionIdError::InvalidCharacters);
        }

        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a cart (or order) belongs to. Exactly one key is ever in play.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerKey {
    User(UserUuid),
    Guest(SessionId),
}

impl OwnerKey {
    /// Pick the key a request addresses: an authenticated user always wins
    /// over an anonymous session token.
    #[must_use]
    pub fn resolve(user: Option<UserUuid>, session: Option<SessionId>) -> Option<Self> {
        match (user, session) {
            (Some(user), _) => Some(Self::User(user)),
            (None, Some(session)) => Some(Self::Guest(session)),
            (None, None) => None,
        }
    }

    /// Rebuild a key from the two nullable storage columns.
    #[must_use]
    pub fn from_columns(user: Option<Uuid>, session: Option<String>) -> Option<Self> {
        match (user, session) {
            (Some(user), _) => Some(Self::User(UserUuid::from_uuid(user))),
            (None, Some(session)) => Some(Self::Guest(SessionId(session))),
            (None, None) => None,
        }
    }

    /// Value bound to the `owner_user_uuid` column.
    #[must_use]
    pub fn user_column(&self) -> Option<Uuid> {
        match self {
            Self::User(user) => Some(user.into_uuid()),
            Self::Guest(_) => None,
        }
    }

    /// Value bound to the `owner_session_id` column.
    #[must_use]
    pub fn session_column(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::Guest(session) => Some(session.as_str()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Guest(_) => "guest",
        }
    }
}

impl Display for OwnerKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "user:{user}"),
            Self::Guest(_) => f.write_str("guest:<session>"),
        }
    }
}

//! Authenticated session handed to the store by the auth layer.

use secrecy::{ExposeSecret, SecretString};

use brightique_core::UserId;

use super::user::User;

/// A signed-in user plus the bearer token used for backend calls.
///
/// Token refresh is the auth layer's job; a `Session` is replaced wholesale
/// when the token changes.
#[derive(Clone)]
pub struct Session {
    user: User,
    access_token: SecretString,
}

impl Session {
    /// Create a session for `user`.
    #[must_use]
    pub const fn new(user: User, access_token: SecretString) -> Self {
        Self { user, access_token }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id
    }

    /// The raw bearer token, for building the `Authorization` header.
    #[must_use]
    pub fn bearer_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

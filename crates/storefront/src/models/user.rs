//! Signed-in user identity.

use serde::{Deserialize, Serialize};

use brightique_core::UserId;

/// The authenticated storefront user.
///
/// Mirrors the identity fields the backend returns on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: String,
    /// Whether the user may open the admin back-office.
    #[serde(default)]
    pub is_admin: bool,
}

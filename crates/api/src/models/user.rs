//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use olive_edge_core::{Email, UserId};

/// A shopper account (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name used on reviews and notifications.
    pub name: String,
    /// Whether this account holds staff privileges.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The authenticated-user snapshot stored in the session.
///
/// Deliberately small: everything else is re-read from the database so a
/// stale session cannot resurrect changed account data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub is_admin: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Session storage keys.
pub mod session_keys {
    /// Key under which the [`super::CurrentUser`] snapshot is stored.
    pub const CURRENT_USER: &str = "current_user";
}

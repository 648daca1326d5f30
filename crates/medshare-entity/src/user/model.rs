//! User summary as exposed by the user directory.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use medshare_core::types::UserId;

/// The subset of a user account the sharing subsystem needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    /// User ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
}

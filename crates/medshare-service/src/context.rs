//! Request context carrying the authenticated caller.

use serde::{Deserialize, Serialize};

use medshare_core::types::UserId;

/// Who is acting on the current request.
///
/// Built by the API layer from the upstream identity header and passed
/// into every service method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
}

impl RequestContext {
    /// Creates a context for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

//! User directory backed by the host application's `users` table.

use async_trait::async_trait;
use sqlx::PgPool;

use medshare_core::error::{AppError, ErrorKind};
use medshare_core::result::AppResult;
use medshare_core::types::UserId;
use medshare_entity::user::UserSummary;

use crate::store::UserDirectory;

/// Read-only repository over `users`.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    /// Matches username or email case-insensitively. A username match wins
    /// over an email match on a different account.
    async fn resolve_handle(&self, identifier: &str) -> AppResult<Option<UserId>> {
        sqlx::query_scalar::<_, UserId>(
            "SELECT id FROM users \
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1) \
             ORDER BY (LOWER(username) = LOWER($1)) DESC LIMIT 1",
        )
        .bind(identifier.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve user", e))
    }

    async fn get_user(&self, user_id: UserId) -> AppResult<Option<UserSummary>> {
        sqlx::query_as::<_, UserSummary>("SELECT id, username FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }
}

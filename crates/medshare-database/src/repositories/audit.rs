//! Audit log repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use medshare_core::error::{AppError, ErrorKind};
use medshare_core::result::AppResult;
use medshare_core::types::AuditLogId;
use medshare_entity::audit::CreateAuditLogEntry;

use crate::store::AuditSink;

/// Repository for audit log entries.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for AuditLogRepository {
    async fn record_activity(&self, entry: &CreateAuditLogEntry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, action, entity_type, entity_id, actor_id, description) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(AuditLogId::new())
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.actor_id)
        .bind(&entry.description)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record activity", e))?;

        Ok(())
    }
}

//! Audit trail for sharing activity.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use medshare_core::types::UserId;
use medshare_database::store::AuditSink;
use medshare_entity::audit::CreateAuditLogEntry;

/// Writes activity records to the audit sink.
///
/// Recording never fails the calling operation; sink errors are logged
/// and dropped.
#[derive(Debug, Clone)]
pub struct ActivityRecorder {
    sink: Arc<dyn AuditSink>,
}

impl ActivityRecorder {
    /// Creates a recorder over `sink`.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record one activity.
    pub async fn record(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: impl Into<Uuid>,
        actor_id: UserId,
        description: impl Into<String>,
    ) {
        let entry = CreateAuditLogEntry {
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.into(),
            actor_id,
            description: description.into(),
        };

        if let Err(e) = self.sink.record_activity(&entry).await {
            warn!(
                action = %entry.action,
                entity_id = %entry.entity_id,
                error = %e,
                "Failed to record activity"
            );
        }
    }
}

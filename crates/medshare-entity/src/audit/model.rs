//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use medshare_core::types::{AuditLogId, UserId};

/// An immutable audit log entry recording a sharing action.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: AuditLogId,
    /// The action that was performed (e.g., `"invitation.accept"`).
    pub action: String,
    /// The type of entity acted on (`"invitation"` or `"grant"`).
    pub entity_type: String,
    /// The entity ID.
    pub entity_id: Uuid,
    /// The user who performed the action.
    pub actor_id: UserId,
    /// Human-readable summary.
    pub description: String,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to record an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// The action performed.
    pub action: String,
    /// Entity type.
    pub entity_type: String,
    /// Entity ID.
    pub entity_id: Uuid,
    /// The acting user.
    pub actor_id: UserId,
    /// Human-readable summary.
    pub description: String,
}

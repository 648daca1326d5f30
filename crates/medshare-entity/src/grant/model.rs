//! Grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use medshare_core::types::{GrantId, InvitationId, PatientId, UserId};

use super::permission::PermissionLevel;

/// A recipient's access to one patient record.
///
/// Rows are never deleted. Revocation flips `is_active` and stamps
/// `deactivated_at`; granting again inserts a fresh row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Grant {
    /// Unique grant identifier.
    pub id: GrantId,
    /// The shared patient.
    pub patient_id: PatientId,
    /// Owner of the patient when the grant was created.
    pub owner_id: UserId,
    /// User who received access.
    pub recipient_id: UserId,
    /// Access tier.
    pub permission_level: PermissionLevel,
    /// Whether the grant currently confers access.
    pub is_active: bool,
    /// Invitation whose acceptance produced this grant.
    pub invitation_id: Option<InvitationId>,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
    /// When the grant was deactivated.
    pub deactivated_at: Option<DateTime<Utc>>,
}

/// Data required to create a new grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGrant {
    /// The shared patient.
    pub patient_id: PatientId,
    /// The patient's owner.
    pub owner_id: UserId,
    /// The user receiving access.
    pub recipient_id: UserId,
    /// Access tier.
    pub permission_level: PermissionLevel,
    /// Originating invitation.
    pub invitation_id: Option<InvitationId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Result of asking a store to create a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantCreation {
    /// A new row was inserted.
    Created(Grant),
    /// An active grant for the pair already existed; nothing was inserted.
    Existing(Grant),
}

impl GrantCreation {
    /// The grant that is active for the pair after the call.
    pub fn grant(&self) -> &Grant {
        match self {
            Self::Created(grant) | Self::Existing(grant) => grant,
        }
    }

    /// Consume and return the active grant.
    pub fn into_grant(self) -> Grant {
        match self {
            Self::Created(grant) | Self::Existing(grant) => grant,
        }
    }

    /// Whether this call inserted the row.
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medshare_core::types::{GrantId, InvitationId, PatientId, UserId};
use medshare_entity::grant::PermissionLevel;
use medshare_entity::invitation::{Invitation, InvitationContext, InvitationKind, InvitationStatus};
use medshare_entity::patient::PatientSnapshot;
use medshare_entity::user::UserSummary;
use medshare_service::sharing::{
    PatientGrant, PendingInvitation, RespondOutcome, RevokeOutcome, SendOutcome, SharedPatient,
};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Result of sending an invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendInvitationResponse {
    pub invitation_id: InvitationId,
    pub kind: InvitationKind,
    pub expires_at: DateTime<Utc>,
    pub patient_count: usize,
}

impl From<SendOutcome> for SendInvitationResponse {
    fn from(outcome: SendOutcome) -> Self {
        Self {
            invitation_id: outcome.invitation_id(),
            kind: outcome.invitation.kind,
            expires_at: outcome.expires_at(),
            patient_count: outcome.patient_count,
        }
    }
}

/// A pending invitation as listed for its recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInvitationResponse {
    pub id: InvitationId,
    pub kind: InvitationKind,
    pub status: InvitationStatus,
    pub title: String,
    pub message: Option<String>,
    pub context: InvitationContext,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Missing when the sender's account is gone.
    pub sender: Option<UserSummary>,
}

impl From<PendingInvitation> for PendingInvitationResponse {
    fn from(pending: PendingInvitation) -> Self {
        let Invitation {
            id,
            kind,
            status,
            title,
            message,
            context,
            created_at,
            expires_at,
            ..
        } = pending.invitation;

        Self {
            id,
            kind,
            status,
            title,
            message,
            context: context.0,
            created_at,
            expires_at,
            sender: pending.sender,
        }
    }
}

/// Result of accepting or rejecting an invitation.
///
/// `share_id` is set when exactly one grant backs the response; callers of
/// bulk invitations should read `share_ids` and `share_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondResponse {
    pub status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_id: Option<GrantId>,
    pub share_ids: Vec<GrantId>,
    pub share_count: usize,
}

impl From<RespondOutcome> for RespondResponse {
    fn from(outcome: RespondOutcome) -> Self {
        let share_id = match outcome.share_ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        Self {
            status: outcome.status,
            share_id,
            share_count: outcome.share_count(),
            share_ids: outcome.share_ids,
        }
    }
}

/// Result of cancelling an invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub invitation_id: InvitationId,
    pub status: InvitationStatus,
}

impl From<Invitation> for CancelResponse {
    fn from(invitation: Invitation) -> Self {
        Self {
            invitation_id: invitation.id,
            status: invitation.status,
        }
    }
}

/// Result of a recipient dropping their own access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveAccessResponse {
    pub ok: bool,
    /// `false` when no active grant remained to remove.
    pub removed: bool,
}

/// Result of revoking a recipient's access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub ok: bool,
    /// Grant deactivated by this call.
    pub grant_id: Option<GrantId>,
    /// Pending invitations withdrawn by this call.
    pub withdrawn_invitations: Vec<InvitationId>,
}

impl From<RevokeOutcome> for RevokeResponse {
    fn from(outcome: RevokeOutcome) -> Self {
        Self {
            ok: true,
            grant_id: outcome.deactivated,
            withdrawn_invitations: outcome.withdrawn_invitations,
        }
    }
}

/// An active grant on one of the caller's patients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantResponse {
    pub id: GrantId,
    pub recipient_id: UserId,
    pub recipient: Option<UserSummary>,
    pub permission_level: PermissionLevel,
    pub invitation_id: Option<InvitationId>,
    pub created_at: DateTime<Utc>,
}

impl From<PatientGrant> for GrantResponse {
    fn from(entry: PatientGrant) -> Self {
        Self {
            id: entry.grant.id,
            recipient_id: entry.grant.recipient_id,
            recipient: entry.recipient,
            permission_level: entry.grant.permission_level,
            invitation_id: entry.grant.invitation_id,
            created_at: entry.grant.created_at,
        }
    }
}

/// A patient shared with the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedPatientResponse {
    pub grant_id: GrantId,
    pub patient_id: PatientId,
    pub patient: PatientSnapshot,
    pub owner_id: UserId,
    pub permission_level: PermissionLevel,
    pub shared_at: DateTime<Utc>,
}

impl From<SharedPatient> for SharedPatientResponse {
    fn from(shared: SharedPatient) -> Self {
        Self {
            grant_id: shared.grant.id,
            patient_id: shared.patient.id,
            owner_id: shared.grant.owner_id,
            permission_level: shared.grant.permission_level,
            shared_at: shared.grant.created_at,
            patient: shared.patient,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// `"connected"`, `"unavailable"`, or `"not_configured"`.
    pub database: String,
}

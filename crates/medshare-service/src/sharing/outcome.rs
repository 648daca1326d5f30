//! Results returned by the sharing services.

use chrono::{DateTime, Utc};
use serde::Serialize;

use medshare_core::types::{GrantId, InvitationId};
use medshare_entity::grant::Grant;
use medshare_entity::invitation::{Invitation, InvitationStatus};
use medshare_entity::patient::PatientSnapshot;
use medshare_entity::user::UserSummary;

/// A freshly sent invitation.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The stored invitation.
    pub invitation: Invitation,
    /// Number of patients it offers.
    pub patient_count: usize,
}

impl SendOutcome {
    /// The new invitation's ID.
    pub fn invitation_id(&self) -> InvitationId {
        self.invitation.id
    }

    /// The invitation's deadline.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.invitation.expires_at
    }
}

/// A pending invitation together with its sender.
#[derive(Debug, Clone)]
pub struct PendingInvitation {
    /// The invitation.
    pub invitation: Invitation,
    /// The sender, when the directory still knows them.
    pub sender: Option<UserSummary>,
}

/// Result of answering an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RespondOutcome {
    /// The invitation's status after the call.
    pub status: InvitationStatus,
    /// Active grants produced by (or already satisfying) an acceptance, in
    /// the order the invitation lists its patients.
    pub share_ids: Vec<GrantId>,
}

impl RespondOutcome {
    /// Outcome of a rejection.
    pub fn rejected() -> Self {
        Self {
            status: InvitationStatus::Rejected,
            share_ids: Vec::new(),
        }
    }

    /// Outcome of an acceptance.
    pub fn accepted(share_ids: Vec<GrantId>) -> Self {
        Self {
            status: InvitationStatus::Accepted,
            share_ids,
        }
    }

    /// Number of patients the recipient can now access through this invitation.
    pub fn share_count(&self) -> usize {
        self.share_ids.len()
    }
}

/// Result of an owner revoking access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeOutcome {
    /// The grant this call deactivated, if one was active.
    pub deactivated: Option<GrantId>,
    /// Pending invitations for the pair withdrawn by this call.
    pub withdrawn_invitations: Vec<InvitationId>,
}

impl RevokeOutcome {
    /// Whether the call changed anything.
    pub fn changed(&self) -> bool {
        self.deactivated.is_some() || !self.withdrawn_invitations.is_empty()
    }
}

/// An active grant on an owner's patient.
#[derive(Debug, Clone)]
pub struct PatientGrant {
    /// The grant.
    pub grant: Grant,
    /// The recipient, when the directory still knows them.
    pub recipient: Option<UserSummary>,
}

/// A patient shared with the caller.
#[derive(Debug, Clone)]
pub struct SharedPatient {
    /// The grant giving access.
    pub grant: Grant,
    /// Current identifying fields of the patient.
    pub patient: PatientSnapshot,
}

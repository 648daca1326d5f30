//! Storage and directory traits consumed by the sharing services.
//!
//! Every implementation must make the conditional operations atomic:
//! [`GrantStore::create`] never leaves two active grants for one
//! patient/recipient pair, and [`InvitationStore::transition`] only moves
//! an invitation that is still pending.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use medshare_core::result::AppResult;
use medshare_core::types::{GrantId, InvitationId, PatientId, UserId};
use medshare_entity::audit::CreateAuditLogEntry;
use medshare_entity::grant::{CreateGrant, Grant, GrantCreation};
use medshare_entity::invitation::{
    CreateInvitation, Invitation, InvitationKind, StatusTransition,
};
use medshare_entity::patient::PatientRecord;
use medshare_entity::user::UserSummary;

/// Persistence for access grants.
#[async_trait]
pub trait GrantStore: Send + Sync + Debug + 'static {
    /// Insert an active grant unless one already exists for the pair.
    ///
    /// A concurrent insert that loses the race reports the winner's row as
    /// [`GrantCreation::Existing`] instead of failing.
    async fn create(&self, data: &CreateGrant) -> AppResult<GrantCreation>;

    /// Find a grant by ID, active or not.
    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<Grant>>;

    /// Find the active grant for a patient/recipient pair.
    async fn find_active(
        &self,
        patient_id: PatientId,
        recipient_id: UserId,
    ) -> AppResult<Option<Grant>>;

    /// Find the most recent grant for the pair, active or not.
    async fn find_latest_for_pair(
        &self,
        patient_id: PatientId,
        recipient_id: UserId,
    ) -> AppResult<Option<Grant>>;

    /// Active grants on a patient, newest first.
    async fn list_active_for_patient(&self, patient_id: PatientId) -> AppResult<Vec<Grant>>;

    /// Active grants held by a recipient, newest first.
    async fn list_active_for_recipient(&self, recipient_id: UserId) -> AppResult<Vec<Grant>>;

    /// Deactivate a grant. Returns `false` when it was already inactive.
    async fn deactivate(&self, id: GrantId, at: DateTime<Utc>) -> AppResult<bool>;

    /// Deactivate a grant only while it is still active and was issued by
    /// `invitation_id`. Returns `false` when nothing matched.
    async fn deactivate_for_invitation(
        &self,
        id: GrantId,
        invitation_id: InvitationId,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;
}

/// Persistence for invitations.
#[async_trait]
pub trait InvitationStore: Send + Sync + Debug + 'static {
    /// Insert a pending invitation.
    ///
    /// Fails with `PENDING_INVITATION_EXISTS` when another pending
    /// invitation from the same sender already targets the recipient for
    /// any of the offered patients.
    async fn create(&self, data: &CreateInvitation) -> AppResult<Invitation>;

    /// Find an invitation by ID.
    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>>;

    /// Pending invitations addressed to a recipient, newest first. Rows past
    /// their deadline are included; callers expire them.
    async fn list_pending_for_recipient(
        &self,
        recipient_id: UserId,
        kind: Option<InvitationKind>,
    ) -> AppResult<Vec<Invitation>>;

    /// Pending invitations from `sender_id` to `recipient_id` that offer
    /// `patient_id`.
    async fn find_pending_for_target(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        patient_id: PatientId,
    ) -> AppResult<Vec<Invitation>>;

    /// Apply `transition` only if the invitation is still pending.
    ///
    /// Returns the updated row, or `None` when the invitation is missing or
    /// has already left the pending state.
    async fn transition(
        &self,
        id: InvitationId,
        transition: &StatusTransition,
    ) -> AppResult<Option<Invitation>>;

    /// Move every pending invitation whose deadline is at or before `now`
    /// to expired, returning the rows that changed.
    async fn expire_due(&self, now: DateTime<Utc>) -> AppResult<Vec<Invitation>>;

    /// Stamp `revoked_at` on an invitation without changing its status.
    /// Returns `false` when it was already stamped or does not exist.
    async fn mark_revoked(&self, id: InvitationId, at: DateTime<Utc>) -> AppResult<bool>;
}

/// Read access to the patient records owned by the host application.
#[async_trait]
pub trait PatientDirectory: Send + Sync + Debug + 'static {
    /// Look up a patient. Deleted patients are reported as `None`.
    async fn get_patient(&self, patient_id: PatientId) -> AppResult<Option<PatientRecord>>;
}

/// Read access to user accounts owned by the host application.
#[async_trait]
pub trait UserDirectory: Send + Sync + Debug + 'static {
    /// Resolve a free-text handle (username or email) to a user.
    async fn resolve_handle(&self, identifier: &str) -> AppResult<Option<UserId>>;

    /// Look up a user summary.
    async fn get_user(&self, user_id: UserId) -> AppResult<Option<UserSummary>>;
}

/// Destination for audit activities.
#[async_trait]
pub trait AuditSink: Send + Sync + Debug + 'static {
    /// Append one activity record.
    async fn record_activity(&self, entry: &CreateAuditLogEntry) -> AppResult<()>;
}

//! Grant operations outside the invitation flow.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use medshare_core::error::{AppError, ErrorCode};
use medshare_core::result::AppResult;
use medshare_core::traits::Clock;
use medshare_core::types::{PatientId, UserId};
use medshare_database::store::{GrantStore, InvitationStore, UserDirectory};
use medshare_entity::grant::Grant;
use medshare_entity::invitation::{InvitationKind, InvitationStatus, StatusTransition};
use medshare_entity::user::UserSummary;

use super::actions;
use super::outcome::{PatientGrant, RevokeOutcome, SharedPatient};
use super::ownership::OwnershipVerifier;
use crate::activity::ActivityRecorder;
use crate::context::RequestContext;

/// Revokes, removes, and lists grants.
///
/// Deactivation never deletes a row, and never changes an invitation's
/// status except to withdraw one that is still pending.
#[derive(Debug, Clone)]
pub struct SharingService {
    grants: Arc<dyn GrantStore>,
    invitations: Arc<dyn InvitationStore>,
    ownership: Arc<OwnershipVerifier>,
    users: Arc<dyn UserDirectory>,
    activity: Arc<ActivityRecorder>,
    clock: Arc<dyn Clock>,
}

impl SharingService {
    /// Creates a new sharing service.
    pub fn new(
        grants: Arc<dyn GrantStore>,
        invitations: Arc<dyn InvitationStore>,
        ownership: Arc<OwnershipVerifier>,
        users: Arc<dyn UserDirectory>,
        activity: Arc<ActivityRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            grants,
            invitations,
            ownership,
            users,
            activity,
            clock,
        }
    }

    /// Revoke a recipient's access to one of the caller's patients.
    ///
    /// Deactivates the active grant, stamps its originating invitation as
    /// revoked, and withdraws any pending single-patient invitation for the
    /// same recipient and patient. Repeating the call is a no-op success
    /// as long as the pair has ever had a grant.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        patient_id: PatientId,
        recipient_id: UserId,
    ) -> AppResult<RevokeOutcome> {
        let now = self.clock.now();
        self.ownership.assert_owned(ctx.user_id, patient_id).await?;

        let mut outcome = RevokeOutcome {
            deactivated: None,
            withdrawn_invitations: Vec::new(),
        };

        let pending = self
            .invitations
            .find_pending_for_target(ctx.user_id, recipient_id, patient_id)
            .await?;
        for invitation in pending
            .into_iter()
            .filter(|i| i.kind == InvitationKind::Single)
        {
            let transition = StatusTransition::new(InvitationStatus::Revoked, now)
                .with_note(Some("Access revoked by owner".to_string()));
            if self
                .invitations
                .transition(invitation.id, &transition)
                .await?
                .is_some()
            {
                outcome.withdrawn_invitations.push(invitation.id);
            }
        }

        match self.grants.find_active(patient_id, recipient_id).await? {
            Some(grant) => {
                if self.grants.deactivate(grant.id, now).await? {
                    outcome.deactivated = Some(grant.id);
                }
                if let Some(invitation_id) = grant.invitation_id {
                    if let Err(e) = self.invitations.mark_revoked(invitation_id, now).await {
                        warn!(
                            invitation_id = %invitation_id,
                            grant_id = %grant.id,
                            error = %e,
                            "Failed to annotate invitation as revoked"
                        );
                    }
                }
            }
            None if !outcome.changed() => {
                self.require_history(patient_id, recipient_id).await?;
                debug!(
                    patient_id = %patient_id,
                    recipient_id = %recipient_id,
                    "Grant already inactive"
                );
            }
            None => {}
        }

        if !outcome.changed() {
            return Ok(outcome);
        }

        info!(
            owner_id = %ctx.user_id,
            patient_id = %patient_id,
            recipient_id = %recipient_id,
            grant_id = ?outcome.deactivated,
            withdrawn = outcome.withdrawn_invitations.len(),
            "Access revoked"
        );
        self.activity
            .record(
                actions::GRANT_REVOKE,
                "grant",
                outcome
                    .deactivated
                    .map(|id| id.into_uuid())
                    .unwrap_or_else(|| patient_id.into_uuid()),
                ctx.user_id,
                format!("Revoked access of user {recipient_id} to patient {patient_id}"),
            )
            .await;

        Ok(outcome)
    }

    /// Give up the caller's own access to a patient.
    ///
    /// Invitation status is left untouched. Returns whether a grant was
    /// deactivated by this call.
    pub async fn remove_own_access(
        &self,
        ctx: &RequestContext,
        patient_id: PatientId,
    ) -> AppResult<bool> {
        let now = self.clock.now();

        let Some(grant) = self.grants.find_active(patient_id, ctx.user_id).await? else {
            self.require_history(patient_id, ctx.user_id).await?;
            return Ok(false);
        };

        let deactivated = self.grants.deactivate(grant.id, now).await?;
        if deactivated {
            info!(
                recipient_id = %ctx.user_id,
                patient_id = %patient_id,
                grant_id = %grant.id,
                "Access removed by recipient"
            );
            self.activity
                .record(
                    actions::GRANT_REMOVE_SELF,
                    "grant",
                    grant.id,
                    ctx.user_id,
                    format!("Removed own access to patient {patient_id}"),
                )
                .await;
        }
        Ok(deactivated)
    }

    /// Active grants on one of the caller's patients, newest first.
    pub async fn list_grants_for_patient(
        &self,
        ctx: &RequestContext,
        patient_id: PatientId,
    ) -> AppResult<Vec<PatientGrant>> {
        self.ownership.assert_owned(ctx.user_id, patient_id).await?;
        let grants = self.grants.list_active_for_patient(patient_id).await?;

        let mut recipients: HashMap<UserId, Option<UserSummary>> = HashMap::new();
        let mut result = Vec::with_capacity(grants.len());
        for grant in grants {
            let recipient = match recipients.get(&grant.recipient_id) {
                Some(found) => found.clone(),
                None => {
                    let found = self.users.get_user(grant.recipient_id).await?;
                    recipients.insert(grant.recipient_id, found.clone());
                    found
                }
            };
            result.push(PatientGrant { grant, recipient });
        }
        Ok(result)
    }

    /// Patients shared with the caller, newest grant first. Grants whose
    /// patient no longer exists are omitted.
    pub async fn list_shared_patients(&self, ctx: &RequestContext) -> AppResult<Vec<SharedPatient>> {
        let grants = self.grants.list_active_for_recipient(ctx.user_id).await?;

        let mut result = Vec::with_capacity(grants.len());
        for grant in grants {
            match self.ownership.find_patient(grant.patient_id).await? {
                Some(patient) => result.push(SharedPatient {
                    patient: patient.snapshot(),
                    grant,
                }),
                None => debug!(
                    grant_id = %grant.id,
                    patient_id = %grant.patient_id,
                    "Skipping grant for missing patient"
                ),
            }
        }
        Ok(result)
    }

    /// Fail with `GRANT_NOT_FOUND` unless the pair has ever had a grant.
    async fn require_history(&self, patient_id: PatientId, recipient_id: UserId) -> AppResult<Grant> {
        self.grants
            .find_latest_for_pair(patient_id, recipient_id)
            .await?
            .ok_or_else(|| {
                AppError::coded(
                    ErrorCode::GrantNotFound,
                    format!("No grant for patient {patient_id} and user {recipient_id}"),
                )
            })
    }
}

//! Invitation lifecycle: send, list, respond, cancel, expire.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use medshare_core::config::SharingConfig;
use medshare_core::error::{AppError, ErrorCode};
use medshare_core::result::AppResult;
use medshare_core::traits::Clock;
use medshare_core::types::{GrantId, InvitationId, PatientId, UserId};
use medshare_database::store::{GrantStore, InvitationStore, UserDirectory};
use medshare_entity::grant::{CreateGrant, PermissionLevel};
use medshare_entity::invitation::{
    CreateInvitation, Invitation, InvitationContext, InvitationKind, InvitationResponse,
    InvitationStatus, StatusTransition,
};
use medshare_entity::patient::PatientSnapshot;
use medshare_entity::user::UserSummary;

use super::actions;
use super::outcome::{PendingInvitation, RespondOutcome, SendOutcome};
use super::ownership::OwnershipVerifier;
use crate::activity::ActivityRecorder;
use crate::context::RequestContext;

/// Request to invite a user to one or more patients.
#[derive(Debug, Clone)]
pub struct SendInvitationRequest {
    /// Username or email of the recipient.
    pub recipient_identifier: String,
    /// Patients to offer. More than one makes a bulk invitation.
    pub patient_ids: Vec<PatientId>,
    /// Access tier offered.
    pub permission_level: PermissionLevel,
    /// Optional note to the recipient.
    pub message: Option<String>,
    /// Lifetime in hours; the configured default when absent.
    pub expires_hours: Option<i64>,
}

/// Orchestrates the invitation state machine.
///
/// Every status change goes through [`InvitationStore::transition`], which
/// only moves a pending invitation. Losing a race therefore shows up as a
/// `None` from the store and is reported as `INVALID_STATE`.
#[derive(Debug, Clone)]
pub struct InvitationService {
    invitations: Arc<dyn InvitationStore>,
    grants: Arc<dyn GrantStore>,
    ownership: Arc<OwnershipVerifier>,
    users: Arc<dyn UserDirectory>,
    activity: Arc<ActivityRecorder>,
    clock: Arc<dyn Clock>,
    config: SharingConfig,
}

impl InvitationService {
    /// Creates a new invitation service.
    pub fn new(
        invitations: Arc<dyn InvitationStore>,
        grants: Arc<dyn GrantStore>,
        ownership: Arc<OwnershipVerifier>,
        users: Arc<dyn UserDirectory>,
        activity: Arc<ActivityRecorder>,
        clock: Arc<dyn Clock>,
        config: SharingConfig,
    ) -> Self {
        Self {
            invitations,
            grants,
            ownership,
            users,
            activity,
            clock,
            config,
        }
    }

    /// Send an invitation for one or more patients.
    ///
    /// Bulk sends are all-or-nothing: if any patient fails ownership or
    /// uniqueness checks, nothing is stored.
    pub async fn send(
        &self,
        ctx: &RequestContext,
        req: SendInvitationRequest,
    ) -> AppResult<SendOutcome> {
        let now = self.clock.now();
        self.validate_send(&req)?;

        let identifier = req.recipient_identifier.trim();
        let recipient_id = self.users.resolve_handle(identifier).await?.ok_or_else(|| {
            AppError::coded(
                ErrorCode::RecipientNotFound,
                format!("Recipient '{identifier}' not found"),
            )
        })?;

        if recipient_id == ctx.user_id {
            return Err(AppError::coded(
                ErrorCode::SelfShare,
                "You cannot share a patient with yourself",
            ));
        }

        let mut snapshots = Vec::with_capacity(req.patient_ids.len());
        for &patient_id in &req.patient_ids {
            let patient = self.ownership.assert_owned(ctx.user_id, patient_id).await?;
            snapshots.push(patient.snapshot());
        }

        for snapshot in &snapshots {
            self.ensure_not_shared(ctx.user_id, recipient_id, snapshot, now)
                .await?;
        }

        let title = self.build_title(ctx.user_id, &snapshots).await?;
        let context = InvitationContext::from_snapshots(snapshots, req.permission_level)
            .ok_or_else(|| AppError::validation("At least one patient is required"))?;
        let patient_count = context.patient_count();
        let expires_hours = req.expires_hours.unwrap_or(self.config.default_expires_hours);

        let invitation = self
            .invitations
            .create(&CreateInvitation {
                sender_id: ctx.user_id,
                recipient_id,
                title,
                message: req.message.filter(|m| !m.trim().is_empty()),
                context,
                created_at: now,
                expires_at: now + Duration::hours(expires_hours),
            })
            .await?;

        info!(
            invitation_id = %invitation.id,
            sender_id = %ctx.user_id,
            recipient_id = %recipient_id,
            kind = %invitation.kind,
            patient_count,
            "Invitation sent"
        );

        self.activity
            .record(
                actions::INVITATION_SEND,
                "invitation",
                invitation.id,
                ctx.user_id,
                format!(
                    "Invited {identifier} to {patient_count} patient(s) with {} access",
                    req.permission_level
                ),
            )
            .await;

        Ok(SendOutcome {
            invitation,
            patient_count,
        })
    }

    /// Pending, unexpired invitations addressed to the caller, newest first.
    ///
    /// Invitations found past their deadline are moved to expired and left
    /// out of the result.
    pub async fn list_pending(
        &self,
        ctx: &RequestContext,
        kind: Option<InvitationKind>,
    ) -> AppResult<Vec<PendingInvitation>> {
        let now = self.clock.now();
        let pending = self
            .invitations
            .list_pending_for_recipient(ctx.user_id, kind)
            .await?;

        let mut senders: HashMap<UserId, Option<UserSummary>> = HashMap::new();
        let mut result = Vec::with_capacity(pending.len());
        for invitation in pending {
            if invitation.is_expired_at(now) {
                self.expire(&invitation, ctx.user_id, now).await?;
                continue;
            }

            let sender = match senders.get(&invitation.sender_id) {
                Some(cached) => cached.clone(),
                None => {
                    let found = self.users.get_user(invitation.sender_id).await?;
                    senders.insert(invitation.sender_id, found.clone());
                    found
                }
            };
            result.push(PendingInvitation { invitation, sender });
        }

        Ok(result)
    }

    /// Accept or reject an invitation as its recipient.
    ///
    /// Accepting an invitation the caller already accepted returns the same
    /// outcome again, rebuilt from the active grants.
    pub async fn respond(
        &self,
        ctx: &RequestContext,
        invitation_id: InvitationId,
        response: InvitationResponse,
        response_note: Option<String>,
    ) -> AppResult<RespondOutcome> {
        let now = self.clock.now();
        let note = response_note.filter(|n| !n.trim().is_empty());
        if let Some(note) = &note {
            if note.chars().count() > self.config.max_note_length {
                return Err(AppError::validation(format!(
                    "Response note exceeds {} characters",
                    self.config.max_note_length
                )));
            }
        }

        let invitation = self.load(invitation_id).await?;
        if invitation.recipient_id != ctx.user_id {
            return Err(AppError::coded(
                ErrorCode::NotRecipient,
                format!("Invitation {invitation_id} is not addressed to you"),
            ));
        }

        if invitation.status == InvitationStatus::Accepted
            && response == InvitationResponse::Accepted
        {
            debug!(invitation_id = %invitation_id, "Replaying accepted invitation");
            return self.replay_accept(&invitation).await;
        }

        self.ensure_actionable(&invitation, ctx.user_id, now).await?;

        match response {
            InvitationResponse::Rejected => self.reject(ctx, &invitation, note, now).await,
            InvitationResponse::Accepted => self.accept(ctx, &invitation, note, now).await,
        }
    }

    /// Withdraw a pending invitation as its sender.
    pub async fn cancel(
        &self,
        ctx: &RequestContext,
        invitation_id: InvitationId,
    ) -> AppResult<Invitation> {
        let now = self.clock.now();
        let invitation = self.load(invitation_id).await?;
        if invitation.sender_id != ctx.user_id {
            return Err(AppError::coded(
                ErrorCode::NotSender,
                format!("Only the sender can cancel invitation {invitation_id}"),
            ));
        }

        self.ensure_actionable(&invitation, ctx.user_id, now).await?;

        let cancelled = self
            .invitations
            .transition(
                invitation_id,
                &StatusTransition::new(InvitationStatus::Cancelled, now),
            )
            .await?
            .ok_or_else(|| lost_race(invitation_id))?;

        info!(invitation_id = %invitation_id, sender_id = %ctx.user_id, "Invitation cancelled");
        self.activity
            .record(
                actions::INVITATION_CANCEL,
                "invitation",
                invitation_id,
                ctx.user_id,
                format!("Cancelled invitation '{}'", cancelled.title),
            )
            .await;

        Ok(cancelled)
    }

    /// Expire every pending invitation past its deadline. Returns how many
    /// changed.
    pub async fn expire_overdue(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let expired = self.invitations.expire_due(now).await?;

        for invitation in &expired {
            self.activity
                .record(
                    actions::INVITATION_EXPIRE,
                    "invitation",
                    invitation.id,
                    invitation.sender_id,
                    format!("Invitation '{}' expired", invitation.title),
                )
                .await;
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "Expired overdue invitations");
        }
        Ok(expired.len())
    }

    async fn reject(
        &self,
        ctx: &RequestContext,
        invitation: &Invitation,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<RespondOutcome> {
        self.invitations
            .transition(
                invitation.id,
                &StatusTransition::new(InvitationStatus::Rejected, now).with_note(note),
            )
            .await?
            .ok_or_else(|| lost_race(invitation.id))?;

        info!(invitation_id = %invitation.id, recipient_id = %ctx.user_id, "Invitation rejected");
        self.activity
            .record(
                actions::INVITATION_REJECT,
                "invitation",
                invitation.id,
                ctx.user_id,
                format!("Rejected invitation '{}'", invitation.title),
            )
            .await;

        Ok(RespondOutcome::rejected())
    }

    async fn accept(
        &self,
        ctx: &RequestContext,
        invitation: &Invitation,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<RespondOutcome> {
        let mut share_ids = Vec::new();
        let mut created = Vec::new();

        match invitation.context() {
            InvitationContext::Single {
                patient,
                permission_level,
            } => {
                self.ownership
                    .assert_owned(invitation.sender_id, patient.id)
                    .await?;
                let (grant_id, was_created) = self
                    .grant_patient(invitation, patient.id, *permission_level, now)
                    .await?;
                share_ids.push(grant_id);
                if was_created {
                    created.push(grant_id);
                }
            }
            InvitationContext::Bulk {
                patients,
                permission_level,
            } => {
                for patient in patients {
                    if let Err(e) = self
                        .ownership
                        .assert_owned(invitation.sender_id, patient.id)
                        .await
                    {
                        if e.is(ErrorCode::PatientNotFound) || e.is(ErrorCode::NotOwner) {
                            warn!(
                                invitation_id = %invitation.id,
                                patient_id = %patient.id,
                                reason = %e,
                                "Skipping patient in bulk accept"
                            );
                            continue;
                        }
                        return Err(e);
                    }
                    let (grant_id, was_created) = self
                        .grant_patient(invitation, patient.id, *permission_level, now)
                        .await?;
                    share_ids.push(grant_id);
                    if was_created {
                        created.push(grant_id);
                    }
                }
            }
        }

        let transitioned = self
            .invitations
            .transition(
                invitation.id,
                &StatusTransition::new(InvitationStatus::Accepted, now).with_note(note),
            )
            .await?;

        if transitioned.is_none() {
            let current = self.load(invitation.id).await?;
            if current.status != InvitationStatus::Accepted {
                self.compensate(invitation.id, &created, now).await;
                return Err(AppError::coded(
                    ErrorCode::InvalidState,
                    format!("Invitation {} is {}", invitation.id, current.status),
                ));
            }
            debug!(invitation_id = %invitation.id, "Concurrent accept already completed");
            return Ok(RespondOutcome::accepted(share_ids));
        }

        info!(
            invitation_id = %invitation.id,
            recipient_id = %ctx.user_id,
            share_count = share_ids.len(),
            "Invitation accepted"
        );
        self.activity
            .record(
                actions::INVITATION_ACCEPT,
                "invitation",
                invitation.id,
                ctx.user_id,
                format!(
                    "Accepted invitation '{}' ({} of {} patient(s) shared)",
                    invitation.title,
                    share_ids.len(),
                    invitation.context().patient_count()
                ),
            )
            .await;

        Ok(RespondOutcome::accepted(share_ids))
    }

    /// Create (or find) the active grant for one patient. Returns the grant
    /// ID and whether this call inserted it.
    async fn grant_patient(
        &self,
        invitation: &Invitation,
        patient_id: PatientId,
        permission_level: PermissionLevel,
        now: DateTime<Utc>,
    ) -> AppResult<(GrantId, bool)> {
        let creation = self
            .grants
            .create(&CreateGrant {
                patient_id,
                owner_id: invitation.sender_id,
                recipient_id: invitation.recipient_id,
                permission_level,
                invitation_id: Some(invitation.id),
                created_at: now,
            })
            .await?;

        if !creation.was_created() {
            debug!(
                patient_id = %patient_id,
                grant_id = %creation.grant().id,
                "Active grant already present"
            );
        }
        Ok((creation.grant().id, creation.was_created()))
    }

    /// Rebuild the outcome of an earlier accept. Only grants issued by the
    /// invitation's sender count; a later owner's share of the same patient
    /// is not part of this invitation.
    async fn replay_accept(&self, invitation: &Invitation) -> AppResult<RespondOutcome> {
        let mut share_ids = Vec::new();
        for patient_id in invitation.context().patient_ids() {
            match self
                .grants
                .find_active(patient_id, invitation.recipient_id)
                .await?
            {
                Some(grant) if grant.owner_id == invitation.sender_id => share_ids.push(grant.id),
                Some(grant) => debug!(
                    invitation_id = %invitation.id,
                    grant_id = %grant.id,
                    "Ignoring grant issued by another owner"
                ),
                None => {}
            }
        }
        Ok(RespondOutcome::accepted(share_ids))
    }

    /// Deactivate grants this call created after its acceptance lost.
    async fn compensate(&self, invitation_id: InvitationId, created: &[GrantId], now: DateTime<Utc>) {
        for &grant_id in created {
            if let Err(e) = self
                .grants
                .deactivate_for_invitation(grant_id, invitation_id, now)
                .await
            {
                warn!(
                    invitation_id = %invitation_id,
                    grant_id = %grant_id,
                    error = %e,
                    "Failed to roll back grant after lost accept"
                );
            }
        }
        if !created.is_empty() {
            warn!(
                invitation_id = %invitation_id,
                count = created.len(),
                "Rolled back grants from lost accept"
            );
        }
    }

    /// Fail unless the invitation is pending and within its deadline. An
    /// overdue invitation is expired on the way out.
    async fn ensure_actionable(
        &self,
        invitation: &Invitation,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if invitation.status == InvitationStatus::Expired {
            return Err(AppError::coded(
                ErrorCode::Expired,
                format!("Invitation {} has expired", invitation.id),
            ));
        }
        if !invitation.is_pending() {
            return Err(AppError::coded(
                ErrorCode::InvalidState,
                format!("Invitation {} is {}", invitation.id, invitation.status),
            ));
        }
        if invitation.is_expired_at(now) {
            self.expire(invitation, actor_id, now).await?;
            return Err(AppError::coded(
                ErrorCode::Expired,
                format!("Invitation {} has expired", invitation.id),
            ));
        }
        Ok(())
    }

    async fn expire(
        &self,
        invitation: &Invitation,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let expired = self
            .invitations
            .transition(
                invitation.id,
                &StatusTransition::new(InvitationStatus::Expired, now),
            )
            .await?;

        if expired.is_some() {
            info!(invitation_id = %invitation.id, "Invitation expired");
            self.activity
                .record(
                    actions::INVITATION_EXPIRE,
                    "invitation",
                    invitation.id,
                    actor_id,
                    format!("Invitation '{}' expired", invitation.title),
                )
                .await;
        }
        Ok(())
    }

    async fn ensure_not_shared(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        patient: &PatientSnapshot,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.grants.find_active(patient.id, recipient_id).await?.is_some() {
            return Err(AppError::coded(
                ErrorCode::AlreadyShared,
                format!(
                    "Patient {} is already shared with this recipient",
                    patient.id
                ),
            ));
        }

        let pending = self
            .invitations
            .find_pending_for_target(sender_id, recipient_id, patient.id)
            .await?;
        for invitation in pending {
            if invitation.is_expired_at(now) {
                self.expire(&invitation, sender_id, now).await?;
                continue;
            }
            return Err(AppError::coded(
                ErrorCode::PendingInvitationExists,
                format!(
                    "A pending invitation for patient {} already exists ({})",
                    patient.id, invitation.id
                ),
            ));
        }
        Ok(())
    }

    fn validate_send(&self, req: &SendInvitationRequest) -> AppResult<()> {
        if req.recipient_identifier.trim().is_empty() {
            return Err(AppError::validation("Recipient identifier is required"));
        }
        if req.patient_ids.is_empty() {
            return Err(AppError::validation("At least one patient is required"));
        }
        if req.patient_ids.len() > self.config.max_bulk_patients {
            return Err(AppError::validation(format!(
                "An invitation can include at most {} patients",
                self.config.max_bulk_patients
            )));
        }
        let mut seen = HashSet::with_capacity(req.patient_ids.len());
        if let Some(dup) = req.patient_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::validation(format!(
                "Patient {dup} is listed more than once"
            )));
        }
        if let Some(hours) = req.expires_hours {
            if !(1..=self.config.max_expires_hours).contains(&hours) {
                return Err(AppError::validation(format!(
                    "expires_hours must be between 1 and {}",
                    self.config.max_expires_hours
                )));
            }
        }
        if let Some(message) = &req.message {
            if message.chars().count() > self.config.max_message_length {
                return Err(AppError::validation(format!(
                    "Message exceeds {} characters",
                    self.config.max_message_length
                )));
            }
        }
        Ok(())
    }

    async fn build_title(
        &self,
        sender_id: UserId,
        snapshots: &[PatientSnapshot],
    ) -> AppResult<String> {
        let sender = self
            .users
            .get_user(sender_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| "Someone".to_string());

        Ok(match snapshots {
            [only] => format!("{sender} shared {} with you", only.display_name),
            many => format!("{sender} shared {} patient records with you", many.len()),
        })
    }

    async fn load(&self, invitation_id: InvitationId) -> AppResult<Invitation> {
        self.invitations
            .find_by_id(invitation_id)
            .await?
            .ok_or_else(|| {
                AppError::coded(
                    ErrorCode::InvitationNotFound,
                    format!("Invitation {invitation_id} not found"),
                )
            })
    }
}

fn lost_race(invitation_id: InvitationId) -> AppError {
    AppError::coded(
        ErrorCode::InvalidState,
        format!("Invitation {invitation_id} is no longer pending"),
    )
}

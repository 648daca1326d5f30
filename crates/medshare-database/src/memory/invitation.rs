//! In-memory invitation store.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use medshare_core::error::{AppError, ErrorCode};
use medshare_core::result::AppResult;
use medshare_core::types::{InvitationId, PatientId, UserId};
use medshare_entity::invitation::{
    CreateInvitation, Invitation, InvitationKind, InvitationStatus, StatusTransition,
};

use super::lock;
use crate::store::InvitationStore;

/// Invitation rows in insertion order.
#[derive(Debug, Default)]
pub struct MemoryInvitationStore {
    rows: Mutex<Vec<Invitation>>,
}

impl MemoryInvitationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invitation in insertion order.
    pub fn all(&self) -> Vec<Invitation> {
        lock(&self.rows).clone()
    }

    fn newest_first(mut invitations: Vec<Invitation>) -> Vec<Invitation> {
        invitations.reverse();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        invitations
    }

    fn targets(invitation: &Invitation, sender_id: UserId, recipient_id: UserId) -> bool {
        invitation.is_pending()
            && invitation.sender_id == sender_id
            && invitation.recipient_id == recipient_id
    }
}

#[async_trait]
impl InvitationStore for MemoryInvitationStore {
    async fn create(&self, data: &CreateInvitation) -> AppResult<Invitation> {
        let mut rows = lock(&self.rows);

        for patient_id in data.context.patient_ids() {
            let taken = rows.iter().any(|inv| {
                Self::targets(inv, data.sender_id, data.recipient_id)
                    && inv.context().contains(patient_id)
            });
            if taken {
                return Err(AppError::coded(
                    ErrorCode::PendingInvitationExists,
                    format!("A pending invitation for patient {patient_id} already exists"),
                ));
            }
        }

        let invitation = Invitation {
            id: InvitationId::new(),
            sender_id: data.sender_id,
            recipient_id: data.recipient_id,
            kind: data.kind(),
            status: InvitationStatus::Pending,
            title: data.title.clone(),
            message: data.message.clone(),
            context: Json(data.context.clone()),
            created_at: data.created_at,
            expires_at: data.expires_at,
            responded_at: None,
            response_note: None,
            revoked_at: None,
        };
        rows.push(invitation.clone());
        Ok(invitation)
    }

    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>> {
        Ok(lock(&self.rows).iter().find(|i| i.id == id).cloned())
    }

    async fn list_pending_for_recipient(
        &self,
        recipient_id: UserId,
        kind: Option<InvitationKind>,
    ) -> AppResult<Vec<Invitation>> {
        let pending = lock(&self.rows)
            .iter()
            .filter(|i| i.is_pending() && i.recipient_id == recipient_id)
            .filter(|i| kind.is_none_or(|k| i.kind == k))
            .cloned()
            .collect();
        Ok(Self::newest_first(pending))
    }

    async fn find_pending_for_target(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        patient_id: PatientId,
    ) -> AppResult<Vec<Invitation>> {
        let pending = lock(&self.rows)
            .iter()
            .filter(|i| Self::targets(i, sender_id, recipient_id) && i.context().contains(patient_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(pending))
    }

    async fn transition(
        &self,
        id: InvitationId,
        transition: &StatusTransition,
    ) -> AppResult<Option<Invitation>> {
        if !InvitationStatus::Pending.can_transition_to(transition.to) {
            return Err(AppError::internal(format!(
                "Invalid invitation transition to {}",
                transition.to
            )));
        }

        let mut rows = lock(&self.rows);
        let Some(invitation) = rows.iter_mut().find(|i| i.id == id && i.is_pending()) else {
            return Ok(None);
        };

        invitation.status = transition.to;
        invitation.responded_at = Some(transition.at);
        if transition.note.is_some() {
            invitation.response_note = transition.note.clone();
        }
        Ok(Some(invitation.clone()))
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> AppResult<Vec<Invitation>> {
        let mut rows = lock(&self.rows);
        let mut expired = Vec::new();
        for invitation in rows
            .iter_mut()
            .filter(|i| i.is_pending() && i.is_expired_at(now))
        {
            invitation.status = InvitationStatus::Expired;
            invitation.responded_at = Some(now);
            expired.push(invitation.clone());
        }
        Ok(expired)
    }

    async fn mark_revoked(&self, id: InvitationId, at: DateTime<Utc>) -> AppResult<bool> {
        let mut rows = lock(&self.rows);
        match rows
            .iter_mut()
            .find(|i| i.id == id && i.revoked_at.is_none())
        {
            Some(invitation) => {
                invitation.revoked_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

//! Invitation repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use medshare_core::error::{AppError, ErrorCode, ErrorKind};
use medshare_core::result::AppResult;
use medshare_core::types::{InvitationId, PatientId, UserId};
use medshare_entity::invitation::{
    CreateInvitation, Invitation, InvitationKind, InvitationStatus, StatusTransition,
};

use super::is_unique_violation;
use crate::store::InvitationStore;

/// Repository for `invitations` and their `invitation_targets`.
///
/// Each invitation writes one target row per offered patient. A partial
/// unique index on `(sender_id, recipient_id, patient_id) WHERE is_pending`
/// rejects a second pending invitation for the same triple, and every
/// status change clears `is_pending` in the same transaction.
#[derive(Debug, Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Create a new invitation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e))
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    async fn create(&self, data: &CreateInvitation) -> AppResult<Invitation> {
        let mut tx = self.begin().await?;

        let invitation = sqlx::query_as::<_, Invitation>(
            "INSERT INTO invitations \
             (id, sender_id, recipient_id, kind, status, title, message, context, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(InvitationId::new())
        .bind(data.sender_id)
        .bind(data.recipient_id)
        .bind(data.kind())
        .bind(&data.title)
        .bind(&data.message)
        .bind(Json(&data.context))
        .bind(data.created_at)
        .bind(data.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create invitation", e))?;

        for patient_id in data.context.patient_ids() {
            sqlx::query(
                "INSERT INTO invitation_targets \
                 (invitation_id, sender_id, recipient_id, patient_id, is_pending) \
                 VALUES ($1, $2, $3, $4, TRUE)",
            )
            .bind(invitation.id)
            .bind(data.sender_id)
            .bind(data.recipient_id)
            .bind(patient_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::coded(
                        ErrorCode::PendingInvitationExists,
                        format!("A pending invitation for patient {patient_id} already exists"),
                    )
                } else {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to record invitation target",
                        e,
                    )
                }
            })?;
        }

        commit(tx).await?;
        Ok(invitation)
    }

    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find invitation", e))
    }

    async fn list_pending_for_recipient(
        &self,
        recipient_id: UserId,
        kind: Option<InvitationKind>,
    ) -> AppResult<Vec<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations \
             WHERE recipient_id = $1 AND status = 'pending' \
             AND ($2::invitation_kind IS NULL OR kind = $2) \
             ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list pending invitations", e)
        })
    }

    async fn find_pending_for_target(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        patient_id: PatientId,
    ) -> AppResult<Vec<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT i.* FROM invitations i \
             JOIN invitation_targets t ON t.invitation_id = i.id \
             WHERE t.sender_id = $1 AND t.recipient_id = $2 AND t.patient_id = $3 \
             AND t.is_pending = TRUE AND i.status = 'pending' \
             ORDER BY i.created_at DESC",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find pending invitations", e)
        })
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

        let mut tx = self.begin().await?;

        let updated = sqlx::query_as::<_, Invitation>(
            "UPDATE invitations \
             SET status = $2, responded_at = $3, response_note = COALESCE($4, response_note) \
             WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .bind(transition.to)
        .bind(transition.at)
        .bind(&transition.note)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update invitation status", e)
        })?;

        if updated.is_some() {
            sqlx::query("UPDATE invitation_targets SET is_pending = FALSE WHERE invitation_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to release invitation targets",
                        e,
                    )
                })?;
        }

        commit(tx).await?;
        Ok(updated)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> AppResult<Vec<Invitation>> {
        let mut tx = self.begin().await?;

        let expired = sqlx::query_as::<_, Invitation>(
            "UPDATE invitations SET status = 'expired', responded_at = $1 \
             WHERE status = 'pending' AND expires_at <= $1 RETURNING *",
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to expire invitations", e))?;

        if !expired.is_empty() {
            let ids: Vec<InvitationId> = expired.iter().map(|i| i.id).collect();
            sqlx::query(
                "UPDATE invitation_targets SET is_pending = FALSE WHERE invitation_id = ANY($1)",
            )
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Failed to release expired invitation targets",
                    e,
                )
            })?;
        }

        commit(tx).await?;
        Ok(expired)
    }

    async fn mark_revoked(&self, id: InvitationId, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE invitations SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to annotate invitation", e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}

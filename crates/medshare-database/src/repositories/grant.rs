//! Grant repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use medshare_core::error::{AppError, ErrorKind};
use medshare_core::result::AppResult;
use medshare_core::types::{GrantId, InvitationId, PatientId, UserId};
use medshare_entity::grant::{CreateGrant, Grant, GrantCreation};

use super::is_unique_violation;
use crate::store::GrantStore;

/// Repository for rows in `patient_grants`.
///
/// The partial unique index on `(patient_id, recipient_id) WHERE is_active`
/// is what keeps concurrent accepts from producing two active grants.
#[derive(Debug, Clone)]
pub struct GrantRepository {
    pool: PgPool,
}

impl GrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantStore for GrantRepository {
    async fn create(&self, data: &CreateGrant) -> AppResult<GrantCreation> {
        if let Some(existing) = self.find_active(data.patient_id, data.recipient_id).await? {
            return Ok(GrantCreation::Existing(existing));
        }

        let inserted = sqlx::query_as::<_, Grant>(
            "INSERT INTO patient_grants \
             (id, patient_id, owner_id, recipient_id, permission_level, is_active, invitation_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7) RETURNING *",
        )
        .bind(GrantId::new())
        .bind(data.patient_id)
        .bind(data.owner_id)
        .bind(data.recipient_id)
        .bind(data.permission_level)
        .bind(data.invitation_id)
        .bind(data.created_at)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(grant) => Ok(GrantCreation::Created(grant)),
            Err(e) if is_unique_violation(&e) => {
                debug!(
                    patient_id = %data.patient_id,
                    recipient_id = %data.recipient_id,
                    "Concurrent grant insert lost; reading winner"
                );
                self.find_active(data.patient_id, data.recipient_id)
                    .await?
                    .map(GrantCreation::Existing)
                    .ok_or_else(|| {
                        AppError::conflict(format!(
                            "Grant for patient {} and recipient {} changed concurrently",
                            data.patient_id, data.recipient_id
                        ))
                    })
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Database,
                "Failed to create grant",
                e,
            )),
        }
    }

    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>("SELECT * FROM patient_grants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant", e))
    }

    async fn find_active(
        &self,
        patient_id: PatientId,
        recipient_id: UserId,
    ) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM patient_grants \
             WHERE patient_id = $1 AND recipient_id = $2 AND is_active = TRUE",
        )
        .bind(patient_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find active grant", e))
    }

    async fn find_latest_for_pair(
        &self,
        patient_id: PatientId,
        recipient_id: UserId,
    ) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM patient_grants WHERE patient_id = $1 AND recipient_id = $2 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(patient_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant history", e))
    }

    async fn list_active_for_patient(&self, patient_id: PatientId) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM patient_grants WHERE patient_id = $1 AND is_active = TRUE \
             ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list patient grants", e))
    }

    async fn list_active_for_recipient(&self, recipient_id: UserId) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM patient_grants WHERE recipient_id = $1 AND is_active = TRUE \
             ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list recipient grants", e)
        })
    }

    async fn deactivate(&self, id: GrantId, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE patient_grants SET is_active = FALSE, deactivated_at = $2 \
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate grant", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_for_invitation(
        &self,
        id: GrantId,
        invitation_id: InvitationId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE patient_grants SET is_active = FALSE, deactivated_at = $3 \
             WHERE id = $1 AND invitation_id = $2 AND is_active = TRUE",
        )
        .bind(id)
        .bind(invitation_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate grant", e))?;

        Ok(result.rows_affected() > 0)
    }
}

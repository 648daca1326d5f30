//! Patient directory backed by the host application's `patients` table.

use async_trait::async_trait;
use sqlx::PgPool;

use medshare_core::error::{AppError, ErrorKind};
use medshare_core::result::AppResult;
use medshare_core::types::PatientId;
use medshare_entity::patient::PatientRecord;

use crate::store::PatientDirectory;

/// Read-only repository over `patients`. Soft-deleted rows are invisible.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: PgPool,
}

impl PatientRepository {
    /// Create a new patient repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientDirectory for PatientRepository {
    async fn get_patient(&self, patient_id: PatientId) -> AppResult<Option<PatientRecord>> {
        sqlx::query_as::<_, PatientRecord>(
            "SELECT id, owner_id, display_name, birth_date FROM patients \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find patient", e))
    }
}

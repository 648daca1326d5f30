//! Ownership checks against the patient directory.

use std::sync::Arc;

use medshare_core::error::{AppError, ErrorCode};
use medshare_core::result::AppResult;
use medshare_core::types::{PatientId, UserId};
use medshare_database::store::PatientDirectory;
use medshare_entity::patient::PatientRecord;

/// Confirms that a user currently owns a patient.
///
/// Always reads the directory; results are never cached, since a patient
/// may be deleted or transferred between sending and answering an
/// invitation.
#[derive(Debug, Clone)]
pub struct OwnershipVerifier {
    patients: Arc<dyn PatientDirectory>,
}

impl OwnershipVerifier {
    /// Creates a verifier over `patients`.
    pub fn new(patients: Arc<dyn PatientDirectory>) -> Self {
        Self { patients }
    }

    /// Return the patient if `user_id` owns it.
    ///
    /// Fails with `PATIENT_NOT_FOUND` when the patient is gone and
    /// `NOT_OWNER` when someone else owns it.
    pub async fn assert_owned(
        &self,
        user_id: UserId,
        patient_id: PatientId,
    ) -> AppResult<PatientRecord> {
        let patient = self.patients.get_patient(patient_id).await?.ok_or_else(|| {
            AppError::coded(
                ErrorCode::PatientNotFound,
                format!("Patient {patient_id} not found"),
            )
        })?;

        if !patient.is_owned_by(user_id) {
            return Err(AppError::coded(
                ErrorCode::NotOwner,
                format!("User {user_id} does not own patient {patient_id}"),
            ));
        }

        Ok(patient)
    }

    /// Look up a patient without an ownership check.
    pub async fn find_patient(&self, patient_id: PatientId) -> AppResult<Option<PatientRecord>> {
        self.patients.get_patient(patient_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medshare_database::memory::MemoryPatientDirectory;

    #[tokio::test]
    async fn test_assert_owned() {
        let directory = Arc::new(MemoryPatientDirectory::new());
        let verifier = OwnershipVerifier::new(directory.clone());
        let (alice, bob) = (UserId::new(), UserId::new());
        let patient = directory.insert(alice, "Jane Roe", None);

        let record = verifier.assert_owned(alice, patient).await.unwrap();
        assert_eq!(record.id, patient);

        let err = verifier.assert_owned(bob, patient).await.unwrap_err();
        assert!(err.is(ErrorCode::NotOwner));

        directory.remove(patient);
        let err = verifier.assert_owned(alice, patient).await.unwrap_err();
        assert!(err.is(ErrorCode::PatientNotFound));
    }
}

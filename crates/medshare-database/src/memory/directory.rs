//! In-memory patient and user directories.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use medshare_core::result::AppResult;
use medshare_core::types::{PatientId, UserId};
use medshare_entity::patient::PatientRecord;
use medshare_entity::user::UserSummary;

use crate::store::{PatientDirectory, UserDirectory};

/// Patient records keyed by ID.
#[derive(Debug, Default)]
pub struct MemoryPatientDirectory {
    patients: DashMap<PatientId, PatientRecord>,
}

impl MemoryPatientDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a patient owned by `owner_id` and return its ID.
    pub fn insert(
        &self,
        owner_id: UserId,
        display_name: &str,
        birth_date: Option<NaiveDate>,
    ) -> PatientId {
        let id = PatientId::new();
        self.patients.insert(
            id,
            PatientRecord {
                id,
                owner_id,
                display_name: display_name.to_string(),
                birth_date,
            },
        );
        id
    }

    /// Delete a patient.
    pub fn remove(&self, patient_id: PatientId) -> bool {
        self.patients.remove(&patient_id).is_some()
    }

    /// Move a patient to a new owner.
    pub fn transfer(&self, patient_id: PatientId, new_owner: UserId) -> bool {
        match self.patients.get_mut(&patient_id) {
            Some(mut record) => {
                record.owner_id = new_owner;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PatientDirectory for MemoryPatientDirectory {
    async fn get_patient(&self, patient_id: PatientId) -> AppResult<Option<PatientRecord>> {
        Ok(self.patients.get(&patient_id).map(|r| r.value().clone()))
    }
}

#[derive(Debug, Clone)]
struct UserEntry {
    summary: UserSummary,
    email: String,
}

/// User accounts keyed by ID.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, UserEntry>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user and return its ID.
    pub fn insert(&self, username: &str, email: &str) -> UserId {
        let id = UserId::new();
        self.users.insert(
            id,
            UserEntry {
                summary: UserSummary {
                    id,
                    username: username.to_string(),
                },
                email: email.to_string(),
            },
        );
        id
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn resolve_handle(&self, identifier: &str) -> AppResult<Option<UserId>> {
        let needle = identifier.trim();
        let by_username = self
            .users
            .iter()
            .find(|e| e.summary.username.eq_ignore_ascii_case(needle))
            .map(|e| *e.key());
        if by_username.is_some() {
            return Ok(by_username);
        }
        Ok(self
            .users
            .iter()
            .find(|e| e.email.eq_ignore_ascii_case(needle))
            .map(|e| *e.key()))
    }

    async fn get_user(&self, user_id: UserId) -> AppResult<Option<UserSummary>> {
        Ok(self.users.get(&user_id).map(|e| e.summary.clone()))
    }
}

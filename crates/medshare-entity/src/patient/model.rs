//! Patient record and the snapshot stored inside invitations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use medshare_core::types::{PatientId, UserId};

/// A patient as returned by the patient directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PatientRecord {
    /// Patient ID.
    pub id: PatientId,
    /// The user who currently owns the record.
    pub owner_id: UserId,
    /// Name shown to users.
    pub display_name: String,
    /// Date of birth, when recorded.
    pub birth_date: Option<NaiveDate>,
}

impl PatientRecord {
    /// Whether `user_id` is the current owner.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Capture the fields an invitation displays.
    pub fn snapshot(&self) -> PatientSnapshot {
        PatientSnapshot {
            id: self.id,
            display_name: self.display_name.clone(),
            birth_date: self.birth_date,
        }
    }
}

/// Point-in-time copy of a patient's identifying fields.
///
/// Stored in the invitation context so pending invitations render without
/// a live lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    /// Patient ID.
    pub id: PatientId,
    /// Name at the time the invitation was sent.
    pub display_name: String,
    /// Date of birth at the time the invitation was sent.
    pub birth_date: Option<NaiveDate>,
}

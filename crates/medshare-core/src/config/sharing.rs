//! Invitation and grant rules.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Limits applied when sending and answering invitations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Lifetime of an invitation when the sender does not specify one.
    #[serde(default = "default_expires_hours")]
    pub default_expires_hours: i64,
    /// Upper bound for a sender-specified lifetime.
    #[serde(default = "default_max_expires_hours")]
    pub max_expires_hours: i64,
    /// Maximum number of patients in one bulk invitation.
    #[serde(default = "default_max_bulk_patients")]
    pub max_bulk_patients: usize,
    /// Maximum length of the sender's message.
    #[serde(default = "default_max_text_length")]
    pub max_message_length: usize,
    /// Maximum length of the recipient's response note.
    #[serde(default = "default_max_text_length")]
    pub max_note_length: usize,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            default_expires_hours: default_expires_hours(),
            max_expires_hours: default_max_expires_hours(),
            max_bulk_patients: default_max_bulk_patients(),
            max_message_length: default_max_text_length(),
            max_note_length: default_max_text_length(),
        }
    }
}

impl SharingConfig {
    /// Reject settings that would make every send fail.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_expires_hours < 1 {
            return Err(AppError::configuration(
                "sharing.max_expires_hours must be at least 1",
            ));
        }
        if !(1..=self.max_expires_hours).contains(&self.default_expires_hours) {
            return Err(AppError::configuration(format!(
                "sharing.default_expires_hours must be between 1 and {}",
                self.max_expires_hours
            )));
        }
        if self.max_bulk_patients == 0 {
            return Err(AppError::configuration(
                "sharing.max_bulk_patients must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_expires_hours() -> i64 {
    168
}

fn default_max_expires_hours() -> i64 {
    720
}

fn default_max_bulk_patients() -> usize {
    50
}

fn default_max_text_length() -> usize {
    1000
}

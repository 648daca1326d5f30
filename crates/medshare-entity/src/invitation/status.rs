//! Invitation status, kind, and response enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use medshare_core::error::AppError;

/// Lifecycle state of an invitation.
///
/// `Pending` is the only non-terminal state. Every transition leaves
/// `Pending`, and nothing transitions back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Awaiting the recipient's answer.
    Pending,
    /// The recipient accepted; grants were created.
    Accepted,
    /// The recipient declined.
    Rejected,
    /// The sender withdrew the invitation.
    Cancelled,
    /// The owner revoked access for the pair while the invitation was open.
    Revoked,
    /// The invitation was not answered in time.
    Expired,
}

impl InvitationStatus {
    /// Check if the invitation is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Check if moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: InvitationStatus) -> bool {
        matches!(self, Self::Pending) && next.is_terminal()
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an invitation covers one patient or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationKind {
    /// Exactly one patient.
    Single,
    /// Two or more patients.
    Bulk,
}

impl InvitationKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Bulk => "bulk",
        }
    }
}

impl fmt::Display for InvitationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvitationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "bulk" => Ok(Self::Bulk),
            _ => Err(AppError::validation(format!(
                "Invalid invitation type: '{s}' (expected single or bulk)"
            ))),
        }
    }
}

/// The recipient's answer to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationResponse {
    /// Accept and receive access.
    #[serde(alias = "accept")]
    Accepted,
    /// Decline.
    #[serde(alias = "reject")]
    Rejected,
}

impl InvitationResponse {
    /// The status this response moves a pending invitation to.
    pub fn target_status(&self) -> InvitationStatus {
        match self {
            Self::Accepted => InvitationStatus::Accepted,
            Self::Rejected => InvitationStatus::Rejected,
        }
    }
}

impl FromStr for InvitationResponse {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accepted" | "accept" => Ok(Self::Accepted),
            "rejected" | "reject" => Ok(Self::Rejected),
            _ => Err(AppError::validation(format!(
                "Invalid response: '{s}' (expected accepted or rejected)"
            ))),
        }
    }
}

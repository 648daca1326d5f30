//! Invitation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use medshare_core::types::{InvitationId, UserId};

use super::context::InvitationContext;
use super::status::{InvitationKind, InvitationStatus};

/// An offer from a patient owner to another user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    /// Unique invitation identifier.
    pub id: InvitationId,
    /// The owner who sent the invitation.
    pub sender_id: UserId,
    /// The user being invited.
    pub recipient_id: UserId,
    /// Single or bulk.
    pub kind: InvitationKind,
    /// Lifecycle state.
    pub status: InvitationStatus,
    /// Short human-readable title.
    pub title: String,
    /// Optional note from the sender.
    pub message: Option<String>,
    /// Offered patients and permission level.
    pub context: Json<InvitationContext>,
    /// When the invitation was sent.
    pub created_at: DateTime<Utc>,
    /// Deadline after which the invitation can no longer be answered.
    pub expires_at: DateTime<Utc>,
    /// When the invitation left the pending state.
    pub responded_at: Option<DateTime<Utc>>,
    /// Optional note from the recipient (or the reason for a system transition).
    pub response_note: Option<String>,
    /// When access created from this invitation was later revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Whether the invitation still awaits an answer.
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Whether the deadline has been reached at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Borrow the decoded context.
    pub fn context(&self) -> &InvitationContext {
        &self.context.0
    }
}

/// Data required to create a new invitation.
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    /// Sender (owner of every offered patient).
    pub sender_id: UserId,
    /// Invited user.
    pub recipient_id: UserId,
    /// Title shown to the recipient.
    pub title: String,
    /// Optional sender note.
    pub message: Option<String>,
    /// Offered patients and permission level.
    pub context: InvitationContext,
    /// Send time.
    pub created_at: DateTime<Utc>,
    /// Expiry deadline.
    pub expires_at: DateTime<Utc>,
}

impl CreateInvitation {
    /// The kind implied by the context.
    pub fn kind(&self) -> InvitationKind {
        self.context.kind()
    }
}

/// A conditional status change applied by a store.
///
/// The store applies it only while the invitation is still pending.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    /// Target status. Must be terminal.
    pub to: InvitationStatus,
    /// Time of the change.
    pub at: DateTime<Utc>,
    /// Optional note saved in `response_note`.
    pub note: Option<String>,
}

impl StatusTransition {
    /// Create a transition without a note.
    pub fn new(to: InvitationStatus, at: DateTime<Utc>) -> Self {
        Self { to, at, note: None }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

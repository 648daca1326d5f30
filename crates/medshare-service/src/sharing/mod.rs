//! Patient record sharing: invitations, ownership checks, and grants.

pub mod grant;
pub mod invitation;
pub mod outcome;
pub mod ownership;

pub use grant::SharingService;
pub use invitation::{InvitationService, SendInvitationRequest};
pub use outcome::{
    PatientGrant, PendingInvitation, RespondOutcome, RevokeOutcome, SendOutcome, SharedPatient,
};
pub use ownership::OwnershipVerifier;

/// Audit actions written by the sharing services.
pub mod actions {
    /// An invitation was sent.
    pub const INVITATION_SEND: &str = "invitation.send";
    /// An invitation was accepted.
    pub const INVITATION_ACCEPT: &str = "invitation.accept";
    /// An invitation was rejected.
    pub const INVITATION_REJECT: &str = "invitation.reject";
    /// An invitation was cancelled by its sender.
    pub const INVITATION_CANCEL: &str = "invitation.cancel";
    /// An invitation passed its deadline.
    pub const INVITATION_EXPIRE: &str = "invitation.expire";
    /// An owner revoked a recipient's access.
    pub const GRANT_REVOKE: &str = "grant.revoke";
    /// A recipient gave up their own access.
    pub const GRANT_REMOVE_SELF: &str = "grant.remove_self";
}

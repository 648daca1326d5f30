//! Invitation entities.

pub mod context;
pub mod model;
pub mod status;

pub use context::InvitationContext;
pub use model::{CreateInvitation, Invitation, StatusTransition};
pub use status::{InvitationKind, InvitationResponse, InvitationStatus};

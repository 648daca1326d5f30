//! # medshare-service
//!
//! Business logic for patient record sharing. Services receive their
//! collaborators as `Arc` trait objects at construction time, so the same
//! code runs against PostgreSQL in production and in-memory stores in tests.

pub mod activity;
pub mod context;
pub mod sharing;

pub use activity::ActivityRecorder;
pub use context::RequestContext;
pub use sharing::{InvitationService, OwnershipVerifier, SharingService};

#[cfg(test)]
pub(crate) mod fixtures;

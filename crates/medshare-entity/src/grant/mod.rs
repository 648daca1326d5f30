//! Access grant entities.

pub mod model;
pub mod permission;

pub use model::{CreateGrant, Grant, GrantCreation};
pub use permission::PermissionLevel;

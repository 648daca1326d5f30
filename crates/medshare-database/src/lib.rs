//! # medshare-database
//!
//! Storage for the sharing subsystem: the [`store`] traits the services
//! depend on, their PostgreSQL implementations in [`repositories`], and
//! in-memory implementations in [`memory`] for tests and local runs.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

#[cfg(feature = "memory")]
pub mod memory;

pub use connection::DatabasePool;
pub use store::{AuditSink, GrantStore, InvitationStore, PatientDirectory, UserDirectory};

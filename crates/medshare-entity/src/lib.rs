//! # medshare-entity
//!
//! Domain entity models for MedShare. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod audit;
pub mod grant;
pub mod invitation;
pub mod patient;
pub mod user;

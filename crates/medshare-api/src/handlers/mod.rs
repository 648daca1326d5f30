//! Route handlers organized by domain.

pub mod health;
pub mod invitation;
pub mod sharing;

//! Built-in scheduled tasks.

pub mod expiry;

pub use expiry::ExpirySweepTask;

//! Scheduled background tasks for MedShare.
//!
//! This crate provides:
//! - A task trait and executor that time and log each run
//! - A cron scheduler that triggers registered tasks
//! - The invitation expiry sweep

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, ScheduledTask};
pub use scheduler::CronScheduler;

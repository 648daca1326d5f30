//! In-memory implementations of the storage traits.
//!
//! Stores keep their rows in a mutex-guarded table so each conditional
//! operation runs as one critical section, which gives them the same
//! atomicity as the unique indexes and conditional updates in PostgreSQL.
//! Directories are concurrent maps that tests seed and mutate directly.

mod audit;
mod directory;
mod grant;
mod invitation;

pub use audit::MemoryAuditSink;
pub use directory::{MemoryPatientDirectory, MemoryUserDirectory};
pub use grant::MemoryGrantStore;
pub use invitation::MemoryInvitationStore;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a table, recovering the data if a previous holder panicked.
fn lock<T>(table: &Mutex<T>) -> MutexGuard<'_, T> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

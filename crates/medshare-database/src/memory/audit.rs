//! In-memory audit sink.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use medshare_core::error::AppError;
use medshare_core::result::AppResult;
use medshare_core::types::AuditLogId;
use medshare_entity::audit::{AuditLogEntry, CreateAuditLogEntry};

use super::lock;
use crate::store::AuditSink;

/// Collects activities in memory. Can be switched into a failing mode to
/// simulate an unavailable audit log.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditLogEntry>>,
    failing: AtomicBool,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded entries, oldest first.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        lock(&self.entries).clone()
    }

    /// Actions of the recorded entries, oldest first.
    pub fn actions(&self) -> Vec<String> {
        lock(&self.entries).iter().map(|e| e.action.clone()).collect()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record_activity(&self, entry: &CreateAuditLogEntry) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Audit log unavailable"));
        }
        lock(&self.entries).push(AuditLogEntry {
            id: AuditLogId::new(),
            action: entry.action.clone(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id,
            actor_id: entry.actor_id,
            description: entry.description.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

//! Periodic invitation expiry sweep.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use medshare_service::InvitationService;

use crate::executor::{JobExecutionError, ScheduledTask};

/// Expires pending invitations whose deadline has passed.
///
/// Uses the same conditional transition as the read-time check, so running
/// both never changes what callers observe.
#[derive(Debug, Clone)]
pub struct ExpirySweepTask {
    invitations: Arc<InvitationService>,
}

impl ExpirySweepTask {
    /// Create a sweep over `invitations`.
    pub fn new(invitations: Arc<InvitationService>) -> Self {
        Self { invitations }
    }
}

#[async_trait]
impl ScheduledTask for ExpirySweepTask {
    fn name(&self) -> &str {
        "invitation_expiry"
    }

    async fn run(&self) -> Result<Value, JobExecutionError> {
        let expired = self
            .invitations
            .expire_overdue()
            .await
            .map_err(JobExecutionError::from_app_error)?;

        Ok(serde_json::json!({
            "task": "invitation_expiry",
            "expired_invitations": expired,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, Utc};
    use medshare_core::config::SharingConfig;
    use medshare_core::traits::ManualClock;
    use medshare_database::memory::{
        MemoryAuditSink, MemoryGrantStore, MemoryInvitationStore, MemoryPatientDirectory,
        MemoryUserDirectory,
    };
    use medshare_entity::grant::PermissionLevel;
    use medshare_entity::invitation::InvitationStatus;
    use medshare_service::sharing::SendInvitationRequest;
    use medshare_service::{ActivityRecorder, OwnershipVerifier, RequestContext};

    use crate::executor::execute;

    #[tokio::test]
    async fn test_sweep_expires_overdue_invitations() {
        let patients = Arc::new(MemoryPatientDirectory::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let invitations = Arc::new(MemoryInvitationStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let alice = RequestContext::new(users.insert("alice", "alice@clinic.test"));
        users.insert("bob", "bob@clinic.test");
        let patient = patients.insert(alice.user_id, "Jane Roe", None);

        let service = Arc::new(InvitationService::new(
            invitations.clone(),
            Arc::new(MemoryGrantStore::new()),
            Arc::new(OwnershipVerifier::new(patients)),
            users,
            Arc::new(ActivityRecorder::new(Arc::new(MemoryAuditSink::new()))),
            clock.clone(),
            SharingConfig::default(),
        ));

        service
            .send(
                &alice,
                SendInvitationRequest {
                    recipient_identifier: "bob".into(),
                    patient_ids: vec![patient],
                    permission_level: PermissionLevel::View,
                    message: None,
                    expires_hours: Some(1),
                },
            )
            .await
            .unwrap();

        let task: Arc<dyn ScheduledTask> = Arc::new(ExpirySweepTask::new(service));
        let summary = execute(task.clone()).await.unwrap();
        assert_eq!(summary["expired_invitations"], 0);

        clock.advance(Duration::hours(2));
        let summary = execute(task.clone()).await.unwrap();
        assert_eq!(summary["expired_invitations"], 1);
        assert_eq!(invitations.all()[0].status, InvitationStatus::Expired);

        let summary = execute(task).await.unwrap();
        assert_eq!(summary["expired_invitations"], 0);
    }
}
